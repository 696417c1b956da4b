//! services/quiz_service/src/error.rs
//!
//! Defines the primary error type for the quiz service.

use crate::config::ConfigError;
use quiz_core::{PortError, QuizError};

/// The primary error type for the `quiz_service` crate.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a rule violation or port failure raised by the quiz engine.
    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., installing the signal handler).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_becomes_internal_error() {
        let join_err = tokio::spawn(async { panic!("status pass blew up") })
            .await
            .unwrap_err();
        let err = ServiceError::from(join_err);
        assert!(matches!(err, ServiceError::Internal(_)));
        assert!(err.to_string().starts_with("An unexpected internal error occurred:"));
    }

    #[test]
    fn test_quiz_errors_convert() {
        let err: ServiceError = QuizError::InvalidDefinition("empty name".to_string()).into();
        assert!(matches!(err, ServiceError::Quiz(_)));
    }
}
