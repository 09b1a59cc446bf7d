use thiserror::Error;

use crate::config::{PathSettings, ServerSettings, Settings};
use crate::domain::transforms::TransformRules;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_paths(&settings.paths) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_transforms(&settings.transforms) {
            errors.extend(e);
        }

        if settings.output.default_filename.trim().is_empty() {
            errors.push(ValidationError::MissingField(
                "output.default_filename".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_paths(paths: &PathSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if paths.fields.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("paths.fields".to_string()));
        }

        if paths.template.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("paths.template".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_transforms(rules: &TransformRules) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let lists = [
            ("transforms.currency_fields", &rules.currency_fields),
            ("transforms.uppercase_fields", &rules.uppercase_fields),
            ("transforms.escaped_fields", &rules.escaped_fields),
        ];
        for (field, names) in lists {
            if names.iter().any(|n| n.trim().is_empty()) {
                errors.push(ValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: "Field names must not be empty".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
