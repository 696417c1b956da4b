//! services/quiz_service/src/service.rs
//!
//! `QuizService` drives the quiz session state machine against the ports.
//!
//! Each operation reads the clock once, mutates the domain objects it was
//! handed and finishes with an explicit save. Callers must not run two
//! operations for the same (player, quiz) pair at the same time.

use quiz_core::{
    ActivityFeed, BonusOutcome, Clock, PlayerId, PlayerQuiz, QuestionProvider, QuizDefinition, QuizGame,
    QuizId, QuizPlayer, QuizRepository, QuizError, QuizResult, QuizSession, Responses, Reward, RewardEngine,
    ScoringSink,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// The result of a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    /// The points and gold the responses earned, as recorded in the attempt log.
    pub reward: Reward,
    pub bonus: BonusOutcome,
}

#[derive(Clone)]
pub struct QuizService {
    repo: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionProvider>,
    rewards: RewardEngine,
    clock: Arc<dyn Clock>,
}

impl QuizService {
    pub fn new(
        repo: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionProvider>,
        scoring: Arc<dyn ScoringSink>,
        activity: Arc<dyn ActivityFeed>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            questions,
            rewards: RewardEngine::new(scoring, activity, Some(QuizGame::QPOOL_CATEGORY.to_string())),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    //=====================================================================================
    // Quiz Definitions
    //=====================================================================================

    /// Validates and stores a new definition.
    pub async fn create_quiz(&self, quiz: &QuizDefinition) -> QuizResult<()> {
        quiz.validate()?;
        self.repo.save_quiz(quiz).await?;
        info!(quiz_id = %quiz.id, name = %quiz.name, "Quiz created.");
        Ok(())
    }

    pub async fn list_quizzes(&self) -> QuizResult<Vec<QuizDefinition>> {
        Ok(self.repo.list_quizzes().await?)
    }

    pub async fn activate(&self, quiz: &mut QuizDefinition) -> QuizResult<()> {
        quiz.activate();
        self.save_status(quiz).await
    }

    pub async fn deactivate(&self, quiz: &mut QuizDefinition) -> QuizResult<()> {
        quiz.deactivate();
        self.save_status(quiz).await
    }

    pub async fn expire(&self, quiz: &mut QuizDefinition) -> QuizResult<()> {
        quiz.expire();
        self.save_status(quiz).await
    }

    async fn save_status(&self, quiz: &QuizDefinition) -> QuizResult<()> {
        self.repo.save_quiz(quiz).await?;
        info!(quiz_id = %quiz.id, status = ?quiz.status, "Quiz status set.");
        Ok(())
    }

    //=====================================================================================
    // Sessions
    //=====================================================================================

    /// Loads the player's session for `quiz_id`, creating and saving a fresh one if needed.
    pub async fn open_session(
        &self,
        player_id: PlayerId,
        quiz_id: QuizId,
    ) -> QuizResult<(QuizDefinition, QuizSession)> {
        let quiz = self.repo.get_quiz(quiz_id).await?;
        let session = match self.repo.find_session(player_id, quiz_id).await? {
            Some(session) => session,
            None => {
                let session = QuizSession::new(player_id, quiz_id);
                self.repo.save_session(&session).await?;
                debug!(session_id = %session.id, %player_id, %quiz_id, "Created quiz session.");
                session
            }
        };
        Ok((quiz, session))
    }

    /// Draws the session's questions from the pool, unless it already has some.
    pub async fn assign_questions(&self, quiz: &QuizDefinition, session: &mut QuizSession) -> QuizResult<()> {
        if session.has_questions() {
            return Ok(());
        }
        let eligible = self
            .questions
            .fetch(&quiz.tags, QuizGame::QPOOL_CATEGORY)
            .await?;
        let pool_size = eligible.len();
        session.assign_questions(quiz, eligible, &mut rand::thread_rng());
        if pool_size < quiz.question_count {
            info!(
                quiz_id = %quiz.id,
                wanted = quiz.question_count,
                available = pool_size,
                "Question pool smaller than requested; assigning what is available."
            );
        }
        self.repo.save_session(session).await?;
        Ok(())
    }

    pub async fn start(&self, session: &mut QuizSession) -> QuizResult<()> {
        session.start(self.clock.now());
        self.repo.save_session(session).await?;
        info!(session_id = %session.id, player_id = %session.player_id, "Quiz session started.");
        Ok(())
    }

    /// Grades `responses`, settles the bonus against earlier attempts, then
    /// records the attempt and marks the session played.
    ///
    /// The deadline is not enforced here; check `time_remaining` first if late
    /// submissions should be refused.
    pub async fn submit(
        &self,
        quiz: &QuizDefinition,
        session: &mut QuizSession,
        responses: &Responses,
    ) -> QuizResult<Submission> {
        if quiz.id != session.quiz_id {
            return Err(QuizError::InvalidDefinition(format!(
                "session {} belongs to quiz {}, not {}",
                session.id, session.quiz_id, quiz.id
            )));
        }
        let now = self.clock.now();
        let reward = RewardEngine::grade(responses, &session.questions, quiz)?;
        let bonus = self
            .rewards
            .apply_bonus(session.player_id, quiz, &session.attempts, reward)
            .await?;
        session.record_attempt(now, reward);
        self.repo.save_session(session).await?;

        info!(
            session_id = %session.id,
            player_id = %session.player_id,
            points = reward.points,
            gold = reward.gold,
            bonus = ?bonus,
            "Quiz submitted."
        );
        Ok(Submission { reward, bonus })
    }

    pub fn time_remaining(&self, quiz: &QuizDefinition, session: &QuizSession) -> Option<i64> {
        session.time_remaining(quiz, self.clock.now())
    }

    pub fn can_replay(&self, quiz: &QuizDefinition, session: &QuizSession) -> bool {
        session.can_replay(quiz, self.clock.now())
    }

    pub fn days_until_replay(&self, quiz: &QuizDefinition, session: &QuizSession) -> i64 {
        session.days_until_replay(quiz, self.clock.now())
    }

    //=====================================================================================
    // Players
    //=====================================================================================

    /// Loads every quiz the player has a session for.
    pub async fn load_player(&self, player_id: PlayerId) -> QuizResult<QuizPlayer> {
        let sessions = self.repo.list_sessions_for_player(player_id).await?;
        let mut quizzes = Vec::with_capacity(sessions.len());
        for session in sessions {
            let quiz = self.repo.get_quiz(session.quiz_id).await?;
            quizzes.push(PlayerQuiz { quiz, session });
        }
        Ok(QuizPlayer::new(player_id, quizzes))
    }
}
