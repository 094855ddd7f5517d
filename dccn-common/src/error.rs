//! Common error types for DCCN

use thiserror::Error;

use crate::model::SubmissionStatus;

/// Common result type for DCCN operations
pub type Result<T> = std::result::Result<T, Error>;

/// Field-level validation failure, e.g. a review submitted without scores
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Common error types across DCCN crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested submission status change is not allowed from the current status
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    /// Acting user may not perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Form-like validation failed on one or more fields
    #[error("Validation failed: {}", .0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect::<Vec<_>>().join("; "))]
    Validation(Vec<FieldError>),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(what: &str, id: i64) -> Self {
        Error::NotFound(format!("{} #{}", what, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = Error::Validation(vec![
            FieldError::new("clarity", "Must select a score"),
            FieldError::new("details", "Review details must have at least 150 words"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("clarity: Must select a score"));
        assert!(msg.contains("details: Review details"));
    }

    #[test]
    fn test_transition_message() {
        let err = Error::InvalidTransition {
            from: SubmissionStatus::Submitted,
            to: SubmissionStatus::Published,
        };
        assert_eq!(err.to_string(), "Invalid transition: SUBMIT -> PUBLISH");
    }
}
