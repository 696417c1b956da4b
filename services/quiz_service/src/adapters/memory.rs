//! services/quiz_service/src/adapters/memory.rs
//!
//! In-process implementations of every port, for tests and local runs
//! without a database. A single `InMemoryStore` plays repository, question
//! pool, ledger and activity feed at once, so everything it was asked to
//! record can be inspected afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quiz_core::{
    ActivityFeed, ActivityNotice, Amount, Clock, PlayerId, PortError, PortResult, Question, QuestionProvider,
    QuizDefinition, QuizId, QuizRepository, QuizSession, ScoreCredit, ScoringSink, Tag,
};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Default)]
pub struct InMemoryStore {
    quizzes: Mutex<HashMap<QuizId, QuizDefinition>>,
    sessions: Mutex<HashMap<(PlayerId, QuizId), QuizSession>>,
    pool: Mutex<Vec<(String, Question)>>,
    credits: Mutex<Vec<ScoreCredit>>,
    notices: Mutex<Vec<ActivityNotice>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a question to the pool under `category`.
    pub async fn add_question(&self, category: &str, question: Question) {
        self.pool.lock().await.push((category.to_string(), question));
    }

    pub async fn credits(&self) -> Vec<ScoreCredit> {
        self.credits.lock().await.clone()
    }

    /// Sum of every credit in `category` for `player_id`, points and gold alike.
    pub async fn total_credited(&self, player_id: PlayerId, category: &str) -> i64 {
        self.credits
            .lock()
            .await
            .iter()
            .filter(|c| c.player_id == player_id && c.category == category)
            .map(|c| match c.amount {
                Amount::Points(v) | Amount::Gold(v) => v,
            })
            .sum()
    }

    pub async fn notices(&self) -> Vec<ActivityNotice> {
        self.notices.lock().await.clone()
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl QuestionProvider for InMemoryStore {
    async fn fetch(&self, tags: &BTreeSet<Tag>, category: &str) -> PortResult<Vec<Question>> {
        let pool = self.pool.lock().await;
        Ok(pool
            .iter()
            .filter(|(c, q)| c == category && (tags.is_empty() || !q.tags.is_disjoint(tags)))
            .map(|(_, q)| q.clone())
            .collect())
    }
}

#[async_trait]
impl ScoringSink for InMemoryStore {
    async fn score(&self, credit: ScoreCredit) -> PortResult<()> {
        self.credits.lock().await.push(credit);
        Ok(())
    }
}

#[async_trait]
impl ActivityFeed for InMemoryStore {
    async fn record(&self, notice: ActivityNotice) -> PortResult<()> {
        self.notices.lock().await.push(notice);
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for InMemoryStore {
    async fn get_quiz(&self, quiz_id: QuizId) -> PortResult<QuizDefinition> {
        self.quizzes
            .lock()
            .await
            .get(&quiz_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Quiz {} not found", quiz_id)))
    }

    async fn list_quizzes(&self) -> PortResult<Vec<QuizDefinition>> {
        let mut quizzes: Vec<_> = self.quizzes.lock().await.values().cloned().collect();
        quizzes.sort_by_key(|q| q.opens_at);
        Ok(quizzes)
    }

    async fn save_quiz(&self, quiz: &QuizDefinition) -> PortResult<()> {
        self.quizzes.lock().await.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn find_session(&self, player_id: PlayerId, quiz_id: QuizId) -> PortResult<Option<QuizSession>> {
        Ok(self.sessions.lock().await.get(&(player_id, quiz_id)).cloned())
    }

    async fn list_sessions_for_player(&self, player_id: PlayerId) -> PortResult<Vec<QuizSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn save_session(&self, session: &QuizSession) -> PortResult<()> {
        self.sessions
            .lock()
            .await
            .insert((session.player_id, session.quiz_id), session.clone());
        Ok(())
    }
}

//=========================================================================================
// Clock
//=========================================================================================

/// A clock that only moves when told to.
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
