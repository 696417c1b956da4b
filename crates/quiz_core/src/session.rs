//! crates/quiz_core/src/session.rs
//!
//! The quiz session state machine: question assignment, the run timer,
//! recording attempts and the replay cooldown.
//!
//! `NotRunning -> Running -> Played -> Running -> ...`. There is no terminal
//! state and no transition is refused; the caller decides when a replay or a
//! late submission is acceptable.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Attempt, Question, QuizDefinition, QuizSession, Reward, RunState};

impl QuizSession {
    /// Picks `quiz.question_count` questions at random out of `eligible`.
    ///
    /// Does nothing if the session already has questions. With a smaller pool
    /// the session simply gets all of it. Returns whether an assignment happened.
    pub fn assign_questions<R>(&mut self, quiz: &QuizDefinition, mut eligible: Vec<Question>, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        if self.has_questions() {
            return false;
        }
        eligible.shuffle(rng);
        eligible.truncate(quiz.question_count);
        self.questions = eligible;
        true
    }

    /// Moves the session into `Running` and restarts the timer.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.state = RunState::Running;
        self.started_at = Some(now);
    }

    /// Appends the graded attempt and marks the session as played.
    ///
    /// Any bonus must already have been settled against the log as it was
    /// before this call.
    pub fn record_attempt(&mut self, now: DateTime<Utc>, reward: Reward) {
        self.state = RunState::Played;
        self.attempts.push(Attempt::new(now, reward));
    }

    /// Seconds left before the time limit, negative once it has passed.
    /// `None` if the session was never started.
    pub fn time_remaining(&self, quiz: &QuizDefinition, now: DateTime<Utc>) -> Option<i64> {
        self.started_at
            .map(|start| quiz.time_limit_seconds - (now - start).num_seconds())
    }

    pub fn can_replay(&self, quiz: &QuizDefinition, now: DateTime<Utc>) -> bool {
        match self.attempts.last() {
            None => true,
            Some(last) => elapsed_days(last.completed_at, now) >= quiz.replay_cooldown_days,
        }
    }

    pub fn days_until_replay(&self, quiz: &QuizDefinition, now: DateTime<Utc>) -> i64 {
        match self.attempts.last() {
            Some(last) if !self.can_replay(quiz, now) => {
                quiz.replay_cooldown_days - elapsed_days(last.completed_at, now)
            }
            _ => 0,
        }
    }
}

/// Whole days between two instants, rounded down, so a timestamp in the
/// future counts as a negative day.
fn elapsed_days(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_seconds().div_euclid(86_400)
}
