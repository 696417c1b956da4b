pub mod attempts;
pub mod domain;
pub mod error;
pub mod game;
pub mod player;
pub mod ports;
pub mod reward;
pub mod session;

pub use attempts::AttemptLog;
pub use domain::{
    Answer, AnswerId, Attempt, PlayerId, Question, QuestionId, QuizDefinition, QuizId, QuizSession,
    QuizStatus, Responses, Reward, RunState, SessionId, Tag, Visibility,
};
pub use error::{QuizError, QuizResult};
pub use game::{lookup_category, register_category, register_quiz_game, GameModule, QuizGame};
pub use player::{PlayerQuiz, QuizPlayer};
pub use ports::{
    ActivityFeed, ActivityNotice, Amount, Clock, PortError, PortResult, QuestionProvider, QuizRepository,
    ScoreCredit, ScoringSink, SystemClock,
};
pub use reward::{BonusOutcome, RewardEngine, BONUS_GOLD_CATEGORY, BONUS_POINTS_CATEGORY};
