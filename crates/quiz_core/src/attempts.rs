//! crates/quiz_core/src/attempts.rs
//!
//! The append-only history of graded attempts owned by a session.

use serde::{Deserialize, Serialize};

use crate::domain::Attempt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptLog {
    entries: Vec<Attempt>,
}

impl AttemptLog {
    /// Rebuilds a log from entries already in insertion order, e.g. from storage.
    pub fn from_entries(entries: Vec<Attempt>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.entries.push(attempt);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Attempt] {
        &self.entries
    }

    /// The attempt with the most points. On a tie the earliest one wins.
    pub fn best(&self) -> Option<&Attempt> {
        // `Iterator::max_by_key` keeps the last maximum, so fold by hand.
        self.entries.iter().fold(None, |best, attempt| match best {
            Some(b) if b.points >= attempt.points => Some(b),
            _ => Some(attempt),
        })
    }

    /// The most recently appended attempt.
    pub fn last(&self) -> Option<&Attempt> {
        self.entries.last()
    }
}
