use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::form_handler::SharedFields;
use crate::domain::DocumentPort;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub fields: usize,
    pub template: String,
}

pub struct HealthHandler {
    fields: SharedFields,
    document: Arc<dyn DocumentPort>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(fields: SharedFields, document: Arc<dyn DocumentPort>) -> Self {
        Self {
            fields,
            document,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                fields: self.fields.read().await.len(),
                template: if self.document.is_available() { "ok" } else { "missing" }.to_string(),
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Readiness check - the schema has fields and the template is present
    pub async fn ready(&self) -> impl IntoResponse {
        let has_fields = !self.fields.read().await.is_empty();

        if has_fields && self.document.is_available() {
            (StatusCode::OK, Json(serde_json::json!({
                "status": "ready",
                "message": "Form is ready to accept submissions"
            })))
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({
                "status": "not_ready",
                "message": "Field schema is empty or template is missing"
            })))
        }
    }

    /// Liveness check - returns 200 if server is alive
    pub async fn live(&self) -> impl IntoResponse {
        (StatusCode::OK, Json(serde_json::json!({
            "status": "alive",
            "message": "Server is alive"
        })))
    }
}
