//! Error types for the feedback reporting backend
//!
//! This module provides structured error definitions using thiserror and
//! accepts anyhow errors for ad-hoc propagation. The api layer maps each
//! variant onto an HTTP status code.

use thiserror::Error;

/// Main error type for feedback backend operations
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Request parameters or payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, expired or forged credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Password hashing or verification failed
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for feedback backend operations
pub type Result<T> = std::result::Result<T, FeedbackError>;

/// Convert anyhow::Error to FeedbackError
impl From<anyhow::Error> for FeedbackError {
    fn from(err: anyhow::Error) -> Self {
        FeedbackError::Other(err.to_string())
    }
}

impl From<rusqlite::Error> for FeedbackError {
    fn from(err: rusqlite::Error) -> Self {
        FeedbackError::Database(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for FeedbackError {
    fn from(err: bcrypt::BcryptError) -> Self {
        FeedbackError::Hashing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeedbackError::NotFound("Sync run not found: run-1".to_string());
        assert_eq!(err.to_string(), "Sync run not found: run-1");

        let err = FeedbackError::Database("disk I/O error".to_string());
        assert_eq!(err.to_string(), "Database error: disk I/O error");
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json");
        assert!(json_err.is_err());

        let err: FeedbackError = json_err.unwrap_err().into();
        assert!(matches!(err, FeedbackError::Serialization(_)));

        let err: FeedbackError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, FeedbackError::Database(_)));

        let err: FeedbackError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, FeedbackError::Other(ref msg) if msg == "boom"));
    }
}
