//! crates/quiz_core/src/domain.rs
//!
//! Defines the pure, core data structures for the quiz engine.
//! These structs are independent of any database; persistence is handled by
//! adapters implementing the `QuizRepository` port.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::attempts::AttemptLog;
use crate::error::{QuizError, QuizResult};

pub type QuizId = Uuid;
pub type PlayerId = Uuid;
pub type SessionId = Uuid;
pub type QuestionId = Uuid;
pub type AnswerId = Uuid;

/// A tag from the question pool catalog, e.g. "networking".
pub type Tag = String;

/// A player's submission: question id to the set of answer ids they checked.
pub type Responses = HashMap<QuestionId, BTreeSet<AnswerId>>;

//=========================================================================================
// Quiz Definition
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    /// Configured but not yet open to players.
    Pending,
    Active,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    /// Only reachable through a lesson or another restricted entry point.
    Restricted,
}

/// The template a quiz session is played from: schedule, reward caps and
/// the criteria used to pick its questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: QuizId,
    pub name: String,
    pub question_count: usize,
    pub time_limit_seconds: i64,
    pub points_reward: i64,
    pub gold_reward: i64,
    pub tags: BTreeSet<Tag>,
    pub visibility: Visibility,
    pub status: QuizStatus,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub replay_cooldown_days: i64,
}

impl QuizDefinition {
    pub const DEFAULT_QUESTION_COUNT: usize = 5;
    pub const DEFAULT_TIME_LIMIT_SECONDS: i64 = 300;
    pub const DEFAULT_POINTS_REWARD: i64 = 100;
    pub const DEFAULT_GOLD_REWARD: i64 = 30;
    pub const DEFAULT_REPLAY_COOLDOWN_DAYS: i64 = 7;

    /// Creates a pending, public quiz open between `opens_at` and `closes_at`
    /// with the default limits and rewards.
    pub fn new(name: impl Into<String>, opens_at: DateTime<Utc>, closes_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            question_count: Self::DEFAULT_QUESTION_COUNT,
            time_limit_seconds: Self::DEFAULT_TIME_LIMIT_SECONDS,
            points_reward: Self::DEFAULT_POINTS_REWARD,
            gold_reward: Self::DEFAULT_GOLD_REWARD,
            tags: BTreeSet::new(),
            visibility: Visibility::Public,
            status: QuizStatus::Pending,
            opens_at,
            closes_at,
            replay_cooldown_days: Self::DEFAULT_REPLAY_COOLDOWN_DAYS,
        }
    }

    /// Checks the invariants every stored definition must satisfy.
    pub fn validate(&self) -> QuizResult<()> {
        if self.question_count < 1 {
            return Err(QuizError::InvalidDefinition(
                "question_count must be at least 1".to_string(),
            ));
        }
        if self.time_limit_seconds <= 0 {
            return Err(QuizError::InvalidDefinition(
                "time_limit_seconds must be positive".to_string(),
            ));
        }
        if self.points_reward < 0 || self.gold_reward < 0 {
            return Err(QuizError::InvalidDefinition(
                "rewards must not be negative".to_string(),
            ));
        }
        if self.replay_cooldown_days < 0 {
            return Err(QuizError::InvalidDefinition(
                "replay_cooldown_days must not be negative".to_string(),
            ));
        }
        if self.opens_at >= self.closes_at {
            return Err(QuizError::InvalidDefinition(
                "opens_at must be before closes_at".to_string(),
            ));
        }
        Ok(())
    }

    pub fn activate(&mut self) {
        self.status = QuizStatus::Active;
    }

    pub fn deactivate(&mut self) {
        self.status = QuizStatus::Pending;
    }

    pub fn expire(&mut self) {
        self.status = QuizStatus::Expired;
    }

    pub fn is_active(&self) -> bool {
        self.status == QuizStatus::Active
    }

    pub fn is_inactive(&self) -> bool {
        self.status == QuizStatus::Pending
    }

    pub fn is_expired(&self) -> bool {
        self.status == QuizStatus::Expired
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// The status the open/close window implies at `now`.
    ///
    /// Only a hint for whoever drives status changes; `status` itself is never
    /// derived from the clock.
    pub fn scheduled_status(&self, now: DateTime<Utc>) -> QuizStatus {
        if now < self.opens_at {
            QuizStatus::Pending
        } else if now < self.closes_at {
            QuizStatus::Active
        } else {
            QuizStatus::Expired
        }
    }
}

//=========================================================================================
// Question Pool
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
    pub correct: bool,
}

impl Answer {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub tags: BTreeSet<Tag>,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn new(text: impl Into<String>, answers: Vec<Answer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tags: BTreeSet::new(),
            answers,
        }
    }

    /// The ids of every answer flagged as correct.
    pub fn correct_answer_ids(&self) -> BTreeSet<AnswerId> {
        self.answers
            .iter()
            .filter(|a| a.correct)
            .map(|a| a.id)
            .collect()
    }
}

//=========================================================================================
// Rewards and Attempts
//=========================================================================================

/// A points/gold pair, either graded from a submission or credited as bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub points: i64,
    pub gold: i64,
}

impl Reward {
    pub fn new(points: i64, gold: i64) -> Self {
        Self { points, gold }
    }
}

/// One completed grading event within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub completed_at: DateTime<Utc>,
    pub points: i64,
    pub gold: i64,
}

impl Attempt {
    /// Points value of an attempt that was stored before being graded.
    pub const UNGRADED_POINTS: i64 = -1;

    pub fn new(completed_at: DateTime<Utc>, reward: Reward) -> Self {
        Self {
            completed_at,
            points: reward.points,
            gold: reward.gold,
        }
    }

    pub fn is_graded(&self) -> bool {
        self.points != Self::UNGRADED_POINTS
    }

    pub fn reward(&self) -> Reward {
        Reward::new(self.points, self.gold)
    }
}

//=========================================================================================
// Quiz Session
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotRunning,
    Running,
    Played,
}

/// A specific player's instance of a quiz definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub quiz_id: QuizId,
    pub questions: Vec<Question>,
    pub state: RunState,
    pub started_at: Option<DateTime<Utc>>,
    pub attempts: AttemptLog,
}

impl QuizSession {
    pub fn new(player_id: PlayerId, quiz_id: QuizId) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            quiz_id,
            questions: Vec::new(),
            state: RunState::NotRunning,
            started_at: None,
            attempts: AttemptLog::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn is_not_running(&self) -> bool {
        self.state != RunState::Running
    }

    pub fn is_played(&self) -> bool {
        self.state == RunState::Played
    }

    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn quiz() -> QuizDefinition {
        QuizDefinition::new("Networking", now() - Duration::days(1), now() + Duration::days(30))
    }

    #[test]
    fn test_status_transitions_are_unconditional() {
        let mut q = quiz();
        assert!(q.is_inactive());
        q.expire();
        assert!(q.is_expired());
        q.activate();
        q.activate();
        assert!(q.is_active());
        q.deactivate();
        assert!(q.is_inactive());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut q = quiz();
        assert!(q.validate().is_ok());
        q.closes_at = q.opens_at;
        assert!(matches!(q.validate(), Err(QuizError::InvalidDefinition(_))));
    }

    #[test]
    fn test_validate_rejects_zero_questions_and_time_limit() {
        let mut q = quiz();
        q.question_count = 0;
        assert!(q.validate().is_err());

        let mut q = quiz();
        q.time_limit_seconds = 0;
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_scheduled_status_follows_window() {
        let q = quiz();
        assert_eq!(q.scheduled_status(now() - Duration::days(2)), QuizStatus::Pending);
        assert_eq!(q.scheduled_status(now()), QuizStatus::Active);
        assert_eq!(q.scheduled_status(q.closes_at), QuizStatus::Expired);
    }

    #[test]
    fn test_correct_answer_ids() {
        let right = Answer::new("TCP", true);
        let also_right = Answer::new("SCTP", true);
        let wrong = Answer::new("UDP", false);
        let expected: BTreeSet<_> = [right.id, also_right.id].into_iter().collect();
        let q = Question::new("Which are connection oriented?", vec![right, wrong, also_right]);
        assert_eq!(q.correct_answer_ids(), expected);
    }
}
