//! crates/quiz_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the quiz engine's collaborators.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the question pool, the points ledger, the activity feed
//! and the storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{PlayerId, Question, QuizDefinition, QuizId, QuizSession, Tag};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Port Payloads
//=========================================================================================

/// The two currencies the ledger understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Points(i64),
    Gold(i64),
}

/// A single categorized delta for the points/gold ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCredit {
    pub player_id: PlayerId,
    /// The game the credit originates from, if any.
    pub source: Option<String>,
    pub category: String,
    pub amount: Amount,
}

/// A templated, human-readable notice for the activity feed.
///
/// `template` contains `{name}` placeholders filled from `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityNotice {
    pub player_id: PlayerId,
    pub template: String,
    pub fields: BTreeMap<String, String>,
}

impl ActivityNotice {
    pub fn new(player_id: PlayerId, template: impl Into<String>) -> Self {
        Self {
            player_id,
            template: template.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(name.into(), value.to_string());
        self
    }

    /// Substitutes every known `{field}` in the template. Unknown placeholders are left as-is.
    pub fn render(&self) -> String {
        self.fields
            .iter()
            .fold(self.template.clone(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Returns every question in `category` carrying at least one of `tags`, or
    /// the whole category when `tags` is empty. No ordering is guaranteed.
    async fn fetch(&self, tags: &BTreeSet<Tag>, category: &str) -> PortResult<Vec<Question>>;
}

#[async_trait]
pub trait ScoringSink: Send + Sync {
    /// Credits a points or gold delta to a player.
    async fn score(&self, credit: ScoreCredit) -> PortResult<()>;
}

#[async_trait]
pub trait ActivityFeed: Send + Sync {
    async fn record(&self, notice: ActivityNotice) -> PortResult<()>;
}

/// Storage for definitions and sessions. Sessions are loaded with their
/// questions and attempts and written back whole at explicit save points.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    // --- Quiz Definitions ---
    async fn get_quiz(&self, quiz_id: QuizId) -> PortResult<QuizDefinition>;

    async fn list_quizzes(&self) -> PortResult<Vec<QuizDefinition>>;

    async fn save_quiz(&self, quiz: &QuizDefinition) -> PortResult<()>;

    // --- Sessions ---
    async fn find_session(&self, player_id: PlayerId, quiz_id: QuizId) -> PortResult<Option<QuizSession>>;

    async fn list_sessions_for_player(&self, player_id: PlayerId) -> PortResult<Vec<QuizSession>>;

    async fn save_session(&self, session: &QuizSession) -> PortResult<()>;
}

/// The single time source an operation reads from.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
