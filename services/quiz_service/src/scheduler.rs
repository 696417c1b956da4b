//! services/quiz_service/src/scheduler.rs
//!
//! Drives quiz statuses from their open/close window.
//!
//! Statuses only ever change through the explicit `activate`, `deactivate` and
//! `expire` transitions; this module is simply the caller that issues them on a
//! timer.

use futures::future::try_join_all;
use quiz_core::{QuizResult, QuizStatus};
use tracing::{debug, info};

use crate::service::QuizService;

/// Brings every stored quiz in line with `scheduled_status(now)`.
/// Returns how many quizzes changed.
pub async fn sync_statuses(service: &QuizService) -> QuizResult<usize> {
    let now = service.now();
    let stale: Vec<_> = service
        .list_quizzes()
        .await?
        .into_iter()
        .filter_map(|quiz| {
            let wanted = quiz.scheduled_status(now);
            (wanted != quiz.status).then_some((quiz, wanted))
        })
        .collect();

    if stale.is_empty() {
        debug!("All quiz statuses up to date.");
        return Ok(0);
    }

    let updates = stale.into_iter().map(|(mut quiz, wanted)| async move {
        match wanted {
            QuizStatus::Pending => service.deactivate(&mut quiz).await,
            QuizStatus::Active => service.activate(&mut quiz).await,
            QuizStatus::Expired => service.expire(&mut quiz).await,
        }
    });
    let changed = try_join_all(updates).await?.len();

    info!(changed, "Quiz statuses synchronized.");
    Ok(changed)
}
