//! # docfill - Template Document Filler
//!
//! docfill serves a web form built from a declarative field schema and merges
//! the submitted values into a Word (.docx) template, returning the result as
//! a download.
//!
//! ## Features
//!
//! - **Declarative fields**: name, label, type, format, default and hint per field
//! - **Value transforms**: date parts, currency formatting, uppercasing, escaped text
//! - **Required-field validation** before any document is produced
//! - **Live schema reload** when the field file changes
//! - **Health checks** for container orchestration
//!
//! ## Architecture
//!
//! - **Domain**: field definitions, context building, transforms, submission rules
//! - **Adapters**: docx template engine, HTTP handlers, embedded assets
//! - **Config**: settings, field schema loading, validation, file watching

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;

use crate::adapters::form_handler::{self, FormState};
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::ui_handler::UIHandler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `state` - Settings, field schema and template shared by the form routes
/// * `health_handler` - Health check handler
pub fn create_app(state: FormState, health_handler: Arc<HealthHandler>) -> Router {
    let health_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }));

    let form_router = Router::new()
        .route("/", get(form_handler::show_form))
        .route("/generate", post(form_handler::generate))
        .with_state(state);

    health_router
        .merge(form_router)
        .route("/assets/*path", get(UIHandler::serve))
        .layer(TraceLayer::new_for_http())
}
