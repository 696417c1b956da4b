//! crates/quiz_core/src/reward.rs
//!
//! Grading of submitted responses and the "beat your highscore" bonus.

use std::collections::HashMap;
use std::sync::Arc;

use crate::attempts::AttemptLog;
use crate::domain::{PlayerId, Question, QuizDefinition, Responses, Reward};
use crate::error::{QuizError, QuizResult};
use crate::ports::{ActivityFeed, ActivityNotice, Amount, PortResult, ScoreCredit, ScoringSink};

pub const BONUS_POINTS_CATEGORY: &str = "bonus-points";
pub const BONUS_GOLD_CATEGORY: &str = "bonus-gold";

const FIRST_SUBMISSION_NOTICE: &str =
    "received {points} points and {gold} gold bonus for submitting quiz {quiz_name}";
const NEW_HIGHSCORE_NOTICE: &str =
    "received {points} points and {gold} gold bonus for beating their highscore at quiz {quiz_name}";

/// What `RewardEngine::apply_bonus` credited, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusOutcome {
    /// No earlier attempt existed; the whole reward was credited.
    FirstSubmission(Reward),
    /// The earlier best was beaten; the difference was credited.
    NewHighscore(Reward),
    NotBeaten,
}

impl BonusOutcome {
    pub fn credited(&self) -> Option<Reward> {
        match self {
            BonusOutcome::FirstSubmission(r) | BonusOutcome::NewHighscore(r) => Some(*r),
            BonusOutcome::NotBeaten => None,
        }
    }
}

/// Credits bonuses to the ledger and the activity feed.
#[derive(Clone)]
pub struct RewardEngine {
    scoring: Arc<dyn ScoringSink>,
    activity: Arc<dyn ActivityFeed>,
    source: Option<String>,
}

impl RewardEngine {
    /// Creates a new `RewardEngine`. `source` names the game every credit is attributed to.
    pub fn new(scoring: Arc<dyn ScoringSink>, activity: Arc<dyn ActivityFeed>, source: Option<String>) -> Self {
        Self {
            scoring,
            activity,
            source,
        }
    }

    /// Grades `responses` against the session's `questions`.
    ///
    /// A response counts as correct only when the selected answers are exactly
    /// the correct ones. Rewards scale with accuracy and are truncated.
    pub fn grade(responses: &Responses, questions: &[Question], quiz: &QuizDefinition) -> QuizResult<Reward> {
        if responses.is_empty() {
            return Ok(Reward::default());
        }

        let by_id: HashMap<_, _> = questions.iter().map(|q| (q.id, q)).collect();
        let mut correct = 0i64;
        for (question_id, selected) in responses {
            let question = by_id
                .get(question_id)
                .ok_or(QuizError::QuestionNotFound(*question_id))?;
            if *selected == question.correct_answer_ids() {
                correct += 1;
            }
        }

        let accuracy = correct as f64 / responses.len() as f64;
        Ok(Reward::new(
            (accuracy * quiz.points_reward as f64) as i64,
            (accuracy * quiz.gold_reward as f64) as i64,
        ))
    }

    /// Settles the bonus for a freshly graded `reward` against the attempts
    /// recorded *before* it.
    ///
    /// The gold bonus follows the points comparison: a new points highscore
    /// credits `gold - best.gold` even if that is not positive.
    pub async fn apply_bonus(
        &self,
        player_id: PlayerId,
        quiz: &QuizDefinition,
        log: &AttemptLog,
        reward: Reward,
    ) -> PortResult<BonusOutcome> {
        let (bonus, template, outcome) = match log.best() {
            Some(best) if reward.points > best.points => {
                let bonus = Reward::new(reward.points - best.points, reward.gold - best.gold);
                (bonus, NEW_HIGHSCORE_NOTICE, BonusOutcome::NewHighscore(bonus))
            }
            Some(_) => return Ok(BonusOutcome::NotBeaten),
            None => (reward, FIRST_SUBMISSION_NOTICE, BonusOutcome::FirstSubmission(reward)),
        };

        self.credit(player_id, BONUS_POINTS_CATEGORY, Amount::Points(bonus.points))
            .await?;
        self.credit(player_id, BONUS_GOLD_CATEGORY, Amount::Gold(bonus.gold))
            .await?;

        let notice = ActivityNotice::new(player_id, template)
            .with_field("points", bonus.points)
            .with_field("gold", bonus.gold)
            .with_field("quiz_name", &quiz.name);
        self.activity.record(notice).await?;

        Ok(outcome)
    }

    async fn credit(&self, player_id: PlayerId, category: &str, amount: Amount) -> PortResult<()> {
        self.scoring
            .score(ScoreCredit {
                player_id,
                source: self.source.clone(),
                category: category.to_string(),
                amount,
            })
            .await
    }
}
