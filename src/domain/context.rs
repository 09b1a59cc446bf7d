//! Building the template context from a form submission.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::transforms::TransformRules;
use super::{Context, ContextValue, FieldDefinition, FieldKind, WidgetSeed};

/// Form key carrying the requested output filename.
pub const OUTPUT_FILENAME_KEY: &str = "output_filename";

/// Form key under which a field's widget submits its value.
pub fn widget_key(name: &str) -> String {
    format!("field_{}", name)
}

/// Raw values posted by the browser for one request.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    values: HashMap<String, String>,
}

impl Submission {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.values.get(&widget_key(name)).map(String::as_str)
    }

    pub fn output_filename(&self) -> Option<&str> {
        self.values.get(OUTPUT_FILENAME_KEY).map(String::as_str)
    }
}

/// Value a widget shows when the form is rendered again.
///
/// Dates and numbers go through the same coercion as [`build_context`], so
/// a blank or unparsable submission shows the seed that was actually used.
pub fn widget_value(field: &FieldDefinition, submission: Option<&Submission>, today: NaiveDate) -> String {
    let submitted = submission.and_then(|s| s.field(&field.name));
    match field.seed(today) {
        WidgetSeed::Date(seed) => submitted
            .and_then(parse_submitted_date)
            .unwrap_or(seed)
            .format("%Y-%m-%d")
            .to_string(),
        WidgetSeed::Number(seed) => submitted
            .and_then(parse_submitted_number)
            .unwrap_or(seed)
            .to_string(),
        WidgetSeed::Text(seed) => submitted.map(str::to_string).unwrap_or(seed),
    }
}

fn parse_submitted_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_submitted_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Collect one value per field, then run the post-processing transforms.
///
/// Fields are visited in schema order, so a later field with the same key
/// as a derived entry is still overwritten by the derivation.
pub fn build_context(
    fields: &[FieldDefinition],
    submission: &Submission,
    today: NaiveDate,
    rules: &TransformRules,
) -> Context {
    let mut context = Context::new();
    let mut captured_date = None;

    for field in fields {
        let submitted = submission.field(&field.name);
        let value = match (field.kind, field.seed(today)) {
            (FieldKind::Date, WidgetSeed::Date(seed)) => {
                let date = submitted.and_then(parse_submitted_date).unwrap_or(seed);
                if field.name == rules.date_parts_field {
                    captured_date = Some(date);
                }
                ContextValue::Text(format_date(date, field.date_format()))
            }
            (FieldKind::Number, WidgetSeed::Number(seed)) => {
                let number = submitted.and_then(parse_submitted_number).unwrap_or(seed);
                ContextValue::from_number(number)
            }
            (_, seed) => ContextValue::Text(
                submitted.map(str::to_string).unwrap_or_else(|| seed_text(seed)),
            ),
        };
        context.insert(field.name.clone(), value);
    }

    rules.apply(&mut context, captured_date);
    context
}

fn seed_text(seed: WidgetSeed) -> String {
    match seed {
        WidgetSeed::Text(s) => s,
        WidgetSeed::Date(d) => d.to_string(),
        WidgetSeed::Number(n) => n.to_string(),
    }
}

fn format_date(date: NaiveDate, format: &str) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        out = date.format(super::DEFAULT_DATE_FORMAT).to_string();
    }
    out
}
