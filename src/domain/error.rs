//! Error types for schema loading, document rendering, and submissions

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the field schema. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema file does not exist
    #[error("Field schema not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Schema file could not be read
    #[error("Failed to read field schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not a valid field list
    #[error("Failed to parse field schema {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Numeric field with a default that is not a number
    #[error("Field '{field}' has a non-numeric default: '{value}'")]
    InvalidNumber { field: String, value: String },

    /// Date field whose format is not a valid strftime pattern
    #[error("Field '{field}' has an invalid date format: '{format}'")]
    InvalidDateFormat { field: String, format: String },

    /// Two entries share a name
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
}

/// Errors produced by the template engine.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Template file does not exist
    #[error("Template not found at {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// Template could not be read
    #[error("Template I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Template is not a readable document container
    #[error("Invalid document container: {0}")]
    Container(String),

    /// Container lacks a required part
    #[error("Template is missing part '{0}'")]
    MissingPart(String),

    /// Merging the context into a part failed
    #[error("Failed to merge '{part}': {message}")]
    Merge { part: String, message: String },
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Outcome of a rejected submission. Both variants leave the form intact.
#[derive(Debug, Error, PartialEq)]
pub enum SubmissionError {
    /// Required fields were left blank; holds their labels in schema order
    #[error("Please fill required fields: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    /// Template loading or merging failed
    #[error("Failed to generate: {0}")]
    Generation(String),
}

impl From<DocumentError> for SubmissionError {
    fn from(err: DocumentError) -> Self {
        SubmissionError::Generation(err.to_string())
    }
}
