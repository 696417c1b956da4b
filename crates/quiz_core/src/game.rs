//! crates/quiz_core/src/game.rs
//!
//! Game modules and the process-wide registry of question pool categories.
//!
//! Every game that draws questions from the shared pool registers its category
//! once at startup. Registering a category that is already taken is an error.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{QuizError, QuizResult};

/// The capabilities a game exposes to the hosting application.
pub trait GameModule: Send + Sync {
    /// The question pool category this game draws from.
    fn category(&self) -> &'static str;

    /// Display name of the game.
    fn verbose_name(&self) -> &'static str;

    /// Route name of the game's index page in the hosting application.
    fn url_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuizGame;

impl QuizGame {
    pub const QPOOL_CATEGORY: &'static str = "quiz";
}

impl GameModule for QuizGame {
    fn category(&self) -> &'static str {
        Self::QPOOL_CATEGORY
    }

    fn verbose_name(&self) -> &'static str {
        "Quiz"
    }

    fn url_name(&self) -> &'static str {
        "quiz_index_view"
    }
}

static CATEGORIES: Lazy<RwLock<HashMap<String, Arc<dyn GameModule>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Claims `module.category()` for `module`.
pub fn register_category(module: Arc<dyn GameModule>) -> QuizResult<()> {
    let mut categories = CATEGORIES.write().unwrap_or_else(|e| e.into_inner());
    let name = module.category();
    if categories.contains_key(name) {
        return Err(QuizError::CategoryAlreadyRegistered(name.to_string()));
    }
    categories.insert(name.to_string(), module);
    Ok(())
}

pub fn lookup_category(name: &str) -> Option<Arc<dyn GameModule>> {
    CATEGORIES
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
}

/// Registers `QuizGame`. Safe to call again once the quiz category is taken by a quiz game.
pub fn register_quiz_game() -> QuizResult<()> {
    match register_category(Arc::new(QuizGame)) {
        Err(QuizError::CategoryAlreadyRegistered(_))
            if lookup_category(QuizGame::QPOOL_CATEGORY)
                .is_some_and(|m| m.verbose_name() == QuizGame.verbose_name()) =>
        {
            Ok(())
        }
        other => other,
    }
}
