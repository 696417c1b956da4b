//! crates/quiz_core/src/error.rs
//!
//! The error type for the quiz engine's own rules, wrapping `PortError` for
//! failures that come from the external collaborators.

use crate::domain::QuestionId;
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A graded response referenced a question that is not part of the session.
    #[error("Question {0} is not assigned to this session")]
    QuestionNotFound(QuestionId),

    #[error("Invalid quiz definition: {0}")]
    InvalidDefinition(String),

    #[error("Category '{0}' is already registered")]
    CategoryAlreadyRegistered(String),

    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),
}

/// A convenience type alias for `Result<T, QuizError>`.
pub type QuizResult<T> = Result<T, QuizError>;
