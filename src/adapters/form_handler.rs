//! Form page and submission handlers.

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tera::Tera;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::adapters::docx::DOCX_MIME;
use crate::adapters::ui_handler::Asset;
use crate::config::Settings;
use crate::domain::context::{build_context, widget_key, widget_value, Submission};
use crate::domain::submission::generate_document;
use crate::domain::{DocumentPort, FieldDefinition, SubmissionError};

/// Field schema shared with the reload watcher.
pub type SharedFields = Arc<RwLock<Vec<FieldDefinition>>>;

const FORM_TEMPLATE: &str = "form.html";

/// Shared state for the form routes
#[derive(Clone)]
pub struct FormState {
    pub settings: Arc<Settings>,
    pub fields: SharedFields,
    pub document: Arc<dyn DocumentPort>,
    pages: Arc<Tera>,
}

impl FormState {
    pub fn new(
        settings: Arc<Settings>,
        fields: SharedFields,
        document: Arc<dyn DocumentPort>,
    ) -> anyhow::Result<Self> {
        let source = Asset::get(FORM_TEMPLATE)
            .ok_or_else(|| anyhow::anyhow!("Embedded asset '{}' is missing", FORM_TEMPLATE))?;
        let mut pages = Tera::default();
        pages.add_raw_template(FORM_TEMPLATE, std::str::from_utf8(&source.data)?)?;

        Ok(Self {
            settings,
            fields,
            document,
            pages: Arc::new(pages),
        })
    }

    fn render_page(
        &self,
        fields: &[FieldDefinition],
        submission: Option<&Submission>,
        error: Option<String>,
        status: StatusCode,
    ) -> Response {
        let today = Local::now().date_naive();
        let view = FormView {
            title: &self.settings.output.title,
            widgets: fields
                .iter()
                .map(|f| WidgetView::new(f, submission, today))
                .collect(),
            output_filename: submission
                .and_then(Submission::output_filename)
                .unwrap_or(self.settings.output.default_filename.as_str()),
            error,
        };

        let context = match tera::Context::from_serialize(&view) {
            Ok(context) => context,
            Err(e) => return page_error(e),
        };
        match self.pages.render(FORM_TEMPLATE, &context) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => page_error(e),
        }
    }
}

fn page_error(err: tera::Error) -> Response {
    error!("Failed to render form page: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render form").into_response()
}

#[derive(Serialize)]
struct FormView<'a> {
    title: &'a str,
    widgets: Vec<WidgetView>,
    output_filename: &'a str,
    error: Option<String>,
}

#[derive(Serialize)]
struct WidgetView {
    key: String,
    label: String,
    input: &'static str,
    value: String,
    hint: Option<String>,
    required: bool,
}

impl WidgetView {
    fn new(field: &FieldDefinition, submission: Option<&Submission>, today: NaiveDate) -> Self {
        Self {
            key: widget_key(&field.name),
            label: field.label.clone(),
            input: field.kind.input_type(),
            value: widget_value(field, submission, today),
            hint: Some(field.hint.clone()).filter(|h| !h.is_empty()),
            required: field.required,
        }
    }
}

/// GET / - the empty form, seeded with schema defaults
pub async fn show_form(State(state): State<FormState>) -> Response {
    let fields = state.fields.read().await.clone();
    state.render_page(&fields, None, None, StatusCode::OK)
}

/// POST /generate - validate, merge, and return the document as a download
pub async fn generate(
    State(state): State<FormState>,
    Form(values): Form<HashMap<String, String>>,
) -> Response {
    let fields = state.fields.read().await.clone();
    let submission = Submission::new(values);
    let context = build_context(
        &fields,
        &submission,
        Local::now().date_naive(),
        &state.settings.transforms,
    );
    let filename = sanitize_filename(
        submission.output_filename().unwrap_or_default(),
        &state.settings.output.default_filename,
    );

    let document = state.document.clone();
    let job_fields = fields.clone();
    let result = tokio::task::spawn_blocking(move || {
        generate_document(&job_fields, &context, document.as_ref())
    })
    .await
    .unwrap_or_else(|e| Err(SubmissionError::Generation(e.to_string())));

    match result {
        Ok(bytes) => {
            info!("Generated {}.docx ({} bytes)", filename, bytes.len());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, DOCX_MIME.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}.docx\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err @ SubmissionError::MissingRequired(_)) => {
            warn!("Submission rejected: {}", err);
            state.render_page(
                &fields,
                Some(&submission),
                Some(err.to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(err @ SubmissionError::Generation(_)) => {
            error!("{}", err);
            state.render_page(
                &fields,
                Some(&submission),
                Some(err.to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Make a user-supplied name safe for a `Content-Disposition` header.
pub fn sanitize_filename(raw: &str, fallback: &str) -> String {
    let clean = |s: &str| -> String {
        s.trim()
            .chars()
            .map(|c| match c {
                '"' | '\\' | '/' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
                ' ' => ' ',
                c if c.is_ascii_graphic() => c,
                _ => '_',
            })
            .collect::<String>()
            .trim()
            .to_string()
    };
    let name = clean(raw);
    if !name.is_empty() {
        return name;
    }
    let fallback = clean(fallback);
    if fallback.is_empty() {
        "document".to_string()
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Deal 42", "Default"), "Deal 42");
        assert_eq!(sanitize_filename("  ", "Default"), "Default");
        assert_eq!(sanitize_filename("../etc/passwd", "Default"), ".._etc_passwd");
        assert_eq!(sanitize_filename("a\"b\r\nc", "Default"), "a_b__c");
        assert_eq!(sanitize_filename("Café", "Default"), "Caf_");
        assert_eq!(sanitize_filename("", "\n"), "document");
    }
}
