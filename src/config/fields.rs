//! Field schema loading.
//!
//! The schema is a YAML document with a top-level `fields` list:
//!
//! ```yaml
//! fields:
//!   - name: purchaser
//!     required: true
//!     hint: Legal name of the purchasing entity
//!   - name: execution_date
//!     label: Date of Execution
//!     type: date
//!     format: "%B %d, %Y"
//!   - name: purchase_price
//!     type: number
//!     default: 0
//! ```
//!
//! Entries without a `name` are skipped. Every other key is optional.

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::{parse_number_default, FieldDefinition, FieldKind, SchemaError};

#[derive(Debug, Deserialize)]
struct FieldsDocument {
    #[serde(default)]
    fields: Option<Vec<RawField>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawField {
    name: Option<Value>,
    label: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<Value>,
    required: Option<Value>,
    format: Option<Value>,
    default: Option<Value>,
    hint: Option<Value>,
}

/// Read and normalize the field schema at `path`.
pub fn load_fields(path: impl AsRef<Path>) -> Result<Vec<FieldDefinition>, SchemaError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SchemaError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fields = parse_fields(&content, path)?;
    info!("Loaded {} fields from {}", fields.len(), path.display());
    Ok(fields)
}

/// Normalize schema text; `origin` is only used in error messages.
pub fn parse_fields(content: &str, origin: &Path) -> Result<Vec<FieldDefinition>, SchemaError> {
    let document: FieldsDocument =
        serde_yaml::from_str(content).map_err(|e| SchemaError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut seen = HashSet::new();
    let mut fields = Vec::new();

    for (idx, raw) in document.fields.unwrap_or_default().into_iter().enumerate() {
        let Some(name) = raw.name.as_ref().and_then(scalar_text).filter(|n| !n.is_empty()) else {
            warn!("Skipping field schema entry {} without a name", idx);
            continue;
        };
        if !seen.insert(name.clone()) {
            return Err(SchemaError::DuplicateField(name));
        }

        let field = FieldDefinition {
            label: raw
                .label
                .as_ref()
                .and_then(scalar_text)
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| label_from_name(&name)),
            kind: FieldKind::parse(&raw.kind.as_ref().and_then(scalar_text).unwrap_or_default()),
            required: raw.required.as_ref().map(truthy).unwrap_or(false),
            format: raw.format.as_ref().and_then(scalar_text),
            default: raw.default.as_ref().and_then(scalar_text).unwrap_or_default(),
            hint: raw.hint.as_ref().and_then(scalar_text).unwrap_or_default(),
            name,
        };
        check_field(&field)?;
        fields.push(field);
    }

    Ok(fields)
}

fn check_field(field: &FieldDefinition) -> Result<(), SchemaError> {
    match field.kind {
        FieldKind::Number => {
            if parse_number_default(&field.default).is_err() {
                return Err(SchemaError::InvalidNumber {
                    field: field.name.clone(),
                    value: field.default.clone(),
                });
            }
        }
        FieldKind::Date => {
            let format = field.date_format();
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(SchemaError::InvalidDateFormat {
                    field: field.name.clone(),
                    format: format.to_string(),
                });
            }
        }
        FieldKind::Text | FieldKind::TextArea => {}
    }
    Ok(())
}

/// `purchase_price` becomes `Purchase Price`.
///
/// Underscores turn into spaces and every run of letters is capitalized, with
/// the rest of the run lowercased.
pub fn label_from_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if in_word {
                label.extend(ch.to_lowercase());
            } else {
                label.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            label.push(ch);
            in_word = false;
        }
    }
    label
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => truthy(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Vec<FieldDefinition>, SchemaError> {
        parse_fields(content, Path::new("fields.yaml"))
    }

    #[test]
    fn test_label_from_name() {
        assert_eq!(label_from_name("purchase_price"), "Purchase Price");
        assert_eq!(label_from_name("p_reimburse"), "P Reimburse");
        assert_eq!(label_from_name("SIGNATORY_title"), "Signatory Title");
        assert_eq!(label_from_name("line2address"), "Line2Address");
    }

    #[test]
    fn test_defaults_applied() {
        let fields = parse(
            r#"
fields:
  - name: purchase_price
  - name: execution_date
    label: Date of Execution
    type: DATE
    required: true
    format: "%Y-%m-%d"
    default: "2024-01-31"
    hint: When the agreement is signed
"#,
        )
        .unwrap();

        assert_eq!(fields.len(), 2);
        let price = &fields[0];
        assert_eq!(price.label, "Purchase Price");
        assert_eq!(price.kind, FieldKind::Text);
        assert!(!price.required);
        assert_eq!(price.format, None);
        assert_eq!(price.default, "");
        assert_eq!(price.hint, "");

        let date = &fields[1];
        assert_eq!(date.label, "Date of Execution");
        assert_eq!(date.kind, FieldKind::Date);
        assert!(date.required);
        assert_eq!(date.format.as_deref(), Some("%Y-%m-%d"));
        assert_eq!(date.default, "2024-01-31");
        assert_eq!(date.hint, "When the agreement is signed");
    }

    #[test]
    fn test_entries_without_name_are_skipped() {
        let fields = parse(
            r#"
fields:
  - label: Orphan
  - name: ""
  - name: carrier
"#,
        )
        .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "carrier");
    }

    #[test]
    fn test_scalar_defaults_and_flags() {
        let fields = parse(
            r#"
fields:
  - name: count
    type: int
    default: 5
    required: 1
  - name: rate
    type: number
    default: 2.5
    required: "no"
"#,
        )
        .unwrap();
        assert_eq!(fields[0].default, "5");
        assert!(fields[0].required);
        assert_eq!(fields[1].default, "2.5");
        // any non-empty string is truthy
        assert!(fields[1].required);
    }

    #[test]
    fn test_missing_fields_key_is_empty() {
        assert!(parse("title: nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_number_default_is_fatal() {
        let err = parse("fields:\n  - name: count\n    type: int\n    default: lots\n").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNumber { ref field, .. } if field == "count"));
    }

    #[test]
    fn test_blank_label_is_derived() {
        let fields = parse("fields:\n  - name: policy_number\n    label: \"  \"\n").unwrap();
        assert_eq!(fields[0].label, "Policy Number");
    }

    #[test]
    fn test_invalid_date_format_is_fatal() {
        let err = parse("fields:\n  - name: d\n    type: date\n    format: \"%Q\"\n").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDateFormat { .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = parse("fields:\n  - name: a\n  - name: a\n").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(ref n) if n == "a"));
    }

    #[test]
    fn test_unparsable_schema() {
        let err = parse("fields: [unterminated").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("fields.yaml");
        assert!(matches!(load_fields(&missing), Err(SchemaError::NotFound(_))));

        fs::write(&missing, "fields:\n  - name: carrier\n    type: textarea\n").unwrap();
        let fields = load_fields(&missing).unwrap();
        assert_eq!(fields[0].kind, FieldKind::TextArea);
    }
}
