//! Validation and document generation for one submission.

use super::{Context, DocumentPort, FieldDefinition, SubmissionError};

/// Labels of required fields whose context entry is absent or blank, in schema order.
pub fn missing_required(fields: &[FieldDefinition], context: &Context) -> Vec<String> {
    fields
        .iter()
        .filter(|f| f.required)
        .filter(|f| {
            context
                .get(&f.name)
                .map(|v| v.display_text().trim().is_empty())
                .unwrap_or(true)
        })
        .map(|f| f.label.clone())
        .collect()
}

/// Check required fields, then merge the context into the template.
///
/// Nothing is rendered when a required field is blank.
pub fn generate_document(
    fields: &[FieldDefinition],
    context: &Context,
    document: &dyn DocumentPort,
) -> Result<Vec<u8>, SubmissionError> {
    let missing = missing_required(fields, context);
    if !missing.is_empty() {
        return Err(SubmissionError::MissingRequired(missing));
    }
    Ok(document.render(context)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContextValue, DocumentError, DocumentResult, EscapedText, FieldKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPort {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingPort {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl DocumentPort for CountingPort {
        fn render(&self, _context: &Context) -> DocumentResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DocumentError::Merge {
                    part: "word/document.xml".into(),
                    message: "Variable `seller` not found in context".into(),
                })
            } else {
                Ok(b"docx".to_vec())
            }
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn field(name: &str, label: &str, required: bool) -> FieldDefinition {
        FieldDefinition {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            required,
            format: None,
            default: String::new(),
            hint: String::new(),
        }
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            field("purchaser", "Purchaser", true),
            field("carrier", "Insurance Carrier", true),
            field("notes", "Notes", false),
        ]
    }

    #[test]
    fn test_missing_required_lists_labels() {
        let mut ctx = Context::new();
        ctx.insert("purchaser", ContextValue::Escaped(EscapedText::new("   ")));
        ctx.insert("notes", ContextValue::Text(String::new()));

        assert_eq!(
            missing_required(&fields(), &ctx),
            vec!["Purchaser".to_string(), "Insurance Carrier".to_string()]
        );
    }

    #[test]
    fn test_validation_blocks_rendering() {
        let port = CountingPort::new(false);
        let mut ctx = Context::new();
        ctx.insert("purchaser", ContextValue::Text("ACME".into()));
        ctx.insert("carrier", ContextValue::Text("".into()));

        let err = generate_document(&fields(), &ctx, &port).unwrap_err();
        assert_eq!(
            err,
            SubmissionError::MissingRequired(vec!["Insurance Carrier".to_string()])
        );
        assert_eq!(port.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_numbers_satisfy_required() {
        let fields = vec![field("count", "Count", true)];
        let mut ctx = Context::new();
        ctx.insert("count", ContextValue::Integer(0));
        assert!(missing_required(&fields, &ctx).is_empty());
    }

    #[test]
    fn test_generation_success_and_failure() {
        let mut ctx = Context::new();
        ctx.insert("purchaser", ContextValue::Text("ACME".into()));
        ctx.insert("carrier", ContextValue::Text("Life Co".into()));

        let ok = CountingPort::new(false);
        assert_eq!(generate_document(&fields(), &ctx, &ok).unwrap(), b"docx".to_vec());

        let failing = CountingPort::new(true);
        match generate_document(&fields(), &ctx, &failing) {
            Err(SubmissionError::Generation(message)) => assert!(message.contains("seller")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
