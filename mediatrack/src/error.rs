//! Error types for the media tracker
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the presentation layer.

use serde::Serialize;
use thiserror::Error;

/// A single form field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Coarse error category shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Storage,
    NotFound,
    Busy,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entry part not found: {0}")]
    PartNotFound(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("A submission is already in progress")]
    SubmissionInProgress,
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    /// Single-field validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::EntryNotFound(_) | AppError::PartNotFound(_) => ErrorKind::NotFound,
            AppError::SubmissionInProgress => ErrorKind::Busy,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::InvalidValue(_) => ErrorKind::Storage,
        }
    }

    /// Text suitable for an alert dialog. Storage failures are reported
    /// generically; the form state stays intact so the user can retry.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            AppError::EntryNotFound(_) => "Entry not found".to_string(),
            AppError::PartNotFound(_) => "Progress record not found".to_string(),
            AppError::SubmissionInProgress => {
                "Still saving the previous submission, please wait".to_string()
            }
            _ => "Failed to save entry. Please try again.".to_string(),
        }
    }

    /// Field errors carried by a validation failure, empty otherwise
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            AppError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
