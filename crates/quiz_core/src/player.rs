//! crates/quiz_core/src/player.rs
//!
//! The quiz extension of a player: every quiz the player has a session for.

use crate::domain::{PlayerId, QuizDefinition, QuizSession};

/// One quiz as seen by one player.
#[derive(Debug, Clone)]
pub struct PlayerQuiz {
    pub quiz: QuizDefinition,
    pub session: QuizSession,
}

#[derive(Debug, Clone)]
pub struct QuizPlayer {
    pub player_id: PlayerId,
    pub quizzes: Vec<PlayerQuiz>,
}

impl QuizPlayer {
    pub fn new(player_id: PlayerId, quizzes: Vec<PlayerQuiz>) -> Self {
        Self { player_id, quizzes }
    }

    /// Quizzes that are both active and public.
    pub fn active_quizzes(&self) -> Vec<&PlayerQuiz> {
        self.quizzes
            .iter()
            .filter(|pq| pq.quiz.is_active() && pq.quiz.is_public())
            .collect()
    }

    pub fn expired_quizzes(&self) -> Vec<&PlayerQuiz> {
        self.quizzes.iter().filter(|pq| pq.quiz.is_expired()).collect()
    }

    pub fn played_quizzes(&self) -> Vec<&PlayerQuiz> {
        self.quizzes.iter().filter(|pq| pq.session.is_played()).collect()
    }
}
