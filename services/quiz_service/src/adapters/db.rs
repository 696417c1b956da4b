//! services/quiz_service/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `QuizRepository`, `QuestionProvider`, `ScoringSink` and `ActivityFeed` ports
//! from the `core` crate. It handles all interactions with the PostgreSQL
//! database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::{
    ActivityFeed, ActivityNotice, Amount, Answer, Attempt, AttemptLog, PlayerId, PortError, PortResult, Question,
    QuestionId, QuestionProvider, QuizDefinition, QuizId, QuizRepository, QuizSession, QuizStatus, RunState,
    ScoreCredit, ScoringSink, Tag, Visibility,
};
use sqlx::{FromRow, PgPool};
use std::collections::{BTreeSet, HashMap};
use tracing::error;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage-backed port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    error!("Database error: {}", e);
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// Enum <-> Column Mapping
//=========================================================================================

fn status_to_db(status: QuizStatus) -> &'static str {
    match status {
        QuizStatus::Pending => "pending",
        QuizStatus::Active => "active",
        QuizStatus::Expired => "expired",
    }
}

fn status_from_db(value: &str) -> PortResult<QuizStatus> {
    match value {
        "pending" => Ok(QuizStatus::Pending),
        "active" => Ok(QuizStatus::Active),
        "expired" => Ok(QuizStatus::Expired),
        other => Err(PortError::Unexpected(format!("Unknown quiz status '{}'", other))),
    }
}

fn visibility_to_db(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Restricted => "restricted",
    }
}

fn visibility_from_db(value: &str) -> PortResult<Visibility> {
    match value {
        "public" => Ok(Visibility::Public),
        "restricted" => Ok(Visibility::Restricted),
        other => Err(PortError::Unexpected(format!("Unknown quiz visibility '{}'", other))),
    }
}

fn state_to_db(state: RunState) -> &'static str {
    match state {
        RunState::NotRunning => "not_running",
        RunState::Running => "running",
        RunState::Played => "played",
    }
}

fn state_from_db(value: &str) -> PortResult<RunState> {
    match value {
        "not_running" => Ok(RunState::NotRunning),
        "running" => Ok(RunState::Running),
        "played" => Ok(RunState::Played),
        other => Err(PortError::Unexpected(format!("Unknown session state '{}'", other))),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const QUIZ_COLUMNS: &str = "id, name, question_count, time_limit_seconds, points_reward, gold_reward, \
     tags, visibility, status, opens_at, closes_at, replay_cooldown_days";

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    name: String,
    question_count: i32,
    time_limit_seconds: i64,
    points_reward: i64,
    gold_reward: i64,
    tags: Vec<String>,
    visibility: String,
    status: String,
    opens_at: DateTime<Utc>,
    closes_at: DateTime<Utc>,
    replay_cooldown_days: i64,
}
impl QuizRecord {
    fn to_domain(self) -> PortResult<QuizDefinition> {
        Ok(QuizDefinition {
            id: self.id,
            name: self.name,
            question_count: self.question_count.max(0) as usize,
            time_limit_seconds: self.time_limit_seconds,
            points_reward: self.points_reward,
            gold_reward: self.gold_reward,
            tags: self.tags.into_iter().collect(),
            visibility: visibility_from_db(&self.visibility)?,
            status: status_from_db(&self.status)?,
            opens_at: self.opens_at,
            closes_at: self.closes_at,
            replay_cooldown_days: self.replay_cooldown_days,
        })
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    text: String,
    tags: Vec<String>,
}

#[derive(FromRow)]
struct AnswerRecord {
    id: Uuid,
    question_id: Uuid,
    text: String,
    correct: bool,
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    player_id: Uuid,
    quiz_id: Uuid,
    state: String,
    started_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct AttemptRecord {
    completed_at: DateTime<Utc>,
    points: i64,
    gold: i64,
}
impl AttemptRecord {
    fn to_domain(self) -> Attempt {
        Attempt {
            completed_at: self.completed_at,
            points: self.points,
            gold: self.gold,
        }
    }
}

//=========================================================================================
// Loading Helpers
//=========================================================================================

impl DbAdapter {
    /// Attaches answers to question rows, keeping the row order.
    async fn with_answers(&self, records: Vec<QuestionRecord>) -> PortResult<Vec<Question>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let answers = sqlx::query_as::<_, AnswerRecord>(
            "SELECT id, question_id, text, correct FROM answers WHERE question_id = ANY($1) ORDER BY position ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut by_question: HashMap<QuestionId, Vec<Answer>> = HashMap::new();
        for a in answers {
            by_question.entry(a.question_id).or_default().push(Answer {
                id: a.id,
                text: a.text,
                correct: a.correct,
            });
        }

        Ok(records
            .into_iter()
            .map(|r| Question {
                id: r.id,
                text: r.text,
                tags: r.tags.into_iter().collect(),
                answers: by_question.remove(&r.id).unwrap_or_default(),
            })
            .collect())
    }

    /// Materializes a session row together with its questions and attempts.
    async fn load_session(&self, record: SessionRecord) -> PortResult<QuizSession> {
        let question_rows = sqlx::query_as::<_, QuestionRecord>(
            "SELECT q.id, q.text, q.tags FROM session_questions sq \
             JOIN questions q ON q.id = sq.question_id \
             WHERE sq.session_id = $1 ORDER BY sq.position ASC",
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        let questions = self.with_answers(question_rows).await?;

        let attempts = sqlx::query_as::<_, AttemptRecord>(
            "SELECT completed_at, points, gold FROM quiz_attempts WHERE session_id = $1 ORDER BY ordinal ASC",
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(QuizSession {
            id: record.id,
            player_id: record.player_id,
            quiz_id: record.quiz_id,
            questions,
            state: state_from_db(&record.state)?,
            started_at: record.started_at,
            attempts: AttemptLog::from_entries(attempts.into_iter().map(|a| a.to_domain()).collect()),
        })
    }
}

//=========================================================================================
// `QuizRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizRepository for DbAdapter {
    async fn get_quiz(&self, quiz_id: QuizId) -> PortResult<QuizDefinition> {
        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1",
            QUIZ_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Quiz {} not found", quiz_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_quizzes(&self) -> PortResult<Vec<QuizDefinition>> {
        let records = sqlx::query_as::<_, QuizRecord>(&format!(
            "SELECT {} FROM quizzes ORDER BY opens_at ASC",
            QUIZ_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_quiz(&self, quiz: &QuizDefinition) -> PortResult<()> {
        let tags: Vec<Tag> = quiz.tags.iter().cloned().collect();
        sqlx::query(
            "INSERT INTO quizzes (id, name, question_count, time_limit_seconds, points_reward, gold_reward, \
                                  tags, visibility, status, opens_at, closes_at, replay_cooldown_days) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, question_count = EXCLUDED.question_count, \
                time_limit_seconds = EXCLUDED.time_limit_seconds, points_reward = EXCLUDED.points_reward, \
                gold_reward = EXCLUDED.gold_reward, tags = EXCLUDED.tags, visibility = EXCLUDED.visibility, \
                status = EXCLUDED.status, opens_at = EXCLUDED.opens_at, closes_at = EXCLUDED.closes_at, \
                replay_cooldown_days = EXCLUDED.replay_cooldown_days",
        )
        .bind(quiz.id)
        .bind(&quiz.name)
        .bind(quiz.question_count as i32)
        .bind(quiz.time_limit_seconds)
        .bind(quiz.points_reward)
        .bind(quiz.gold_reward)
        .bind(&tags)
        .bind(visibility_to_db(quiz.visibility))
        .bind(status_to_db(quiz.status))
        .bind(quiz.opens_at)
        .bind(quiz.closes_at)
        .bind(quiz.replay_cooldown_days)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn find_session(&self, player_id: PlayerId, quiz_id: QuizId) -> PortResult<Option<QuizSession>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, player_id, quiz_id, state, started_at FROM quiz_sessions \
             WHERE player_id = $1 AND quiz_id = $2",
        )
        .bind(player_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => Ok(Some(self.load_session(record).await?)),
            None => Ok(None),
        }
    }

    async fn list_sessions_for_player(&self, player_id: PlayerId) -> PortResult<Vec<QuizSession>> {
        let records = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, player_id, quiz_id, state, started_at FROM quiz_sessions WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut sessions = Vec::with_capacity(records.len());
        for record in records {
            sessions.push(self.load_session(record).await?);
        }
        Ok(sessions)
    }

    /// Writes the session row, its questions (first assignment only) and any
    /// attempts appended since the last save, in one transaction.
    async fn save_session(&self, session: &QuizSession) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO quiz_sessions (id, player_id, quiz_id, state, started_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET state = EXCLUDED.state, started_at = EXCLUDED.started_at",
        )
        .bind(session.id)
        .bind(session.player_id)
        .bind(session.quiz_id)
        .bind(state_to_db(session.state))
        .bind(session.started_at)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        for (position, question) in session.questions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO session_questions (session_id, question_id, position) VALUES ($1, $2, $3) \
                 ON CONFLICT (session_id, question_id) DO NOTHING",
            )
            .bind(session.id)
            .bind(question.id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        for (ordinal, attempt) in session.attempts.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quiz_attempts (session_id, ordinal, completed_at, points, gold) \
                 VALUES ($1, $2, $3, $4, $5) ON CONFLICT (session_id, ordinal) DO NOTHING",
            )
            .bind(session.id)
            .bind(ordinal as i32)
            .bind(attempt.completed_at)
            .bind(attempt.points)
            .bind(attempt.gold)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `QuestionProvider`, `ScoringSink` and `ActivityFeed` Implementations
//=========================================================================================

#[async_trait]
impl QuestionProvider for DbAdapter {
    async fn fetch(&self, tags: &BTreeSet<Tag>, category: &str) -> PortResult<Vec<Question>> {
        let tags: Vec<Tag> = tags.iter().cloned().collect();
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, text, tags FROM questions \
             WHERE category = $1 AND (cardinality($2::text[]) = 0 OR tags && $2::text[])",
        )
        .bind(category)
        .bind(&tags)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.with_answers(records).await
    }
}

#[async_trait]
impl ScoringSink for DbAdapter {
    async fn score(&self, credit: ScoreCredit) -> PortResult<()> {
        let (points, gold) = match credit.amount {
            Amount::Points(p) => (p, 0),
            Amount::Gold(g) => (0, g),
        };
        sqlx::query(
            "INSERT INTO score_ledger (player_id, source, category, points, gold) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(credit.player_id)
        .bind(&credit.source)
        .bind(&credit.category)
        .bind(points)
        .bind(gold)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl ActivityFeed for DbAdapter {
    async fn record(&self, notice: ActivityNotice) -> PortResult<()> {
        let fields = serde_json::to_value(&notice.fields).map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query("INSERT INTO activities (player_id, template, fields, message) VALUES ($1, $2, $3, $4)")
            .bind(notice.player_id)
            .bind(&notice.template)
            .bind(fields)
            .bind(notice.render())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_columns_round_trip() {
        for status in [QuizStatus::Pending, QuizStatus::Active, QuizStatus::Expired] {
            assert_eq!(status_from_db(status_to_db(status)).unwrap(), status);
        }
        for state in [RunState::NotRunning, RunState::Running, RunState::Played] {
            assert_eq!(state_from_db(state_to_db(state)).unwrap(), state);
        }
        assert_eq!(visibility_from_db("restricted").unwrap(), Visibility::Restricted);
        assert!(status_from_db("archived").is_err());
    }
}
