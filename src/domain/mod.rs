use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod context;
pub mod error;
pub mod submission;
pub mod transforms;

pub use error::{DocumentError, DocumentResult, SchemaError, SubmissionError};

/// Date pattern used when a field has no `format` of its own.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// The widget family a field renders as.
///
/// Unknown `type` strings in the schema fall back to [`FieldKind::Text`], and
/// both `int` and `number` map to [`FieldKind::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    #[serde(rename = "textarea")]
    TextArea,
    Date,
    Number,
}

impl FieldKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "date" => FieldKind::Date,
            "int" | "number" => FieldKind::Number,
            "textarea" => FieldKind::TextArea,
            _ => FieldKind::Text,
        }
    }

    /// Name of the HTML control used for this kind.
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::TextArea => "textarea",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
        }
    }
}

/// One entry of the field schema. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub format: Option<String>,
    pub default: String,
    pub hint: String,
}

/// Initial value shown in a widget before the user edits it.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSeed {
    Text(String),
    Date(NaiveDate),
    Number(f64),
}

impl FieldDefinition {
    /// The strftime pattern for date fields; an empty `format` counts as absent.
    pub fn date_format(&self) -> &str {
        self.format
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_DATE_FORMAT)
    }

    /// Parse `default` into the value the widget starts with.
    ///
    /// An unparsable date default silently becomes `today`. Numeric defaults
    /// are checked when the schema is loaded, so a failure here can only mean
    /// an empty default and yields `0`.
    pub fn seed(&self, today: NaiveDate) -> WidgetSeed {
        match self.kind {
            FieldKind::Date => WidgetSeed::Date(
                parse_date(&self.default, self.date_format()).unwrap_or(today),
            ),
            FieldKind::Number => {
                WidgetSeed::Number(parse_number_default(&self.default).unwrap_or(0.0))
            }
            FieldKind::Text | FieldKind::TextArea => WidgetSeed::Text(self.default.clone()),
        }
    }
}

pub(crate) fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw.trim(), format).ok()
}

/// Parse a numeric default. Empty input is `0.0`; anything else must be a float.
pub(crate) fn parse_number_default(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(0.0)
    } else {
        raw.parse::<f64>()
    }
}

/// Text whose markup-significant characters must reach the document literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedText(String);

impl EscapedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single rendered value in the [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Text(String),
    Escaped(EscapedText),
    Integer(i64),
    Float(f64),
}

impl ContextValue {
    /// Store a number as an integer when it has no fractional part.
    pub fn from_number(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            ContextValue::Integer(value as i64)
        } else {
            ContextValue::Float(value)
        }
    }

    /// Plain textual value, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as the user would read it, without any escaping applied.
    pub fn display_text(&self) -> String {
        match self {
            ContextValue::Text(s) => s.clone(),
            ContextValue::Escaped(t) => t.as_str().to_string(),
            ContextValue::Integer(i) => i.to_string(),
            ContextValue::Float(f) => f.to_string(),
        }
    }
}

/// Name to value mapping handed to the template engine for one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: IndexMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ContextValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ContextValue> {
        self.values.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.values.iter()
    }
}

/// The template engine seen from the submission use case.
pub trait DocumentPort: Send + Sync {
    /// Merge `context` into the template and return the serialized document.
    fn render(&self, context: &Context) -> DocumentResult<Vec<u8>>;

    /// Whether the template is currently present.
    fn is_available(&self) -> bool;
}
