use std::time::Duration;

use tokio::time::MissedTickBehavior;

use exam_core::model::StudentId;

use super::handle::SessionHandle;
use super::workflow::{ExamLoopService, SubmitOutcome};
use crate::error::ExamSessionError;

/// Drive the countdown for a session.
///
/// Ticks once per second, feeding `ExamLoopService::tick`, until the session
/// reaches a terminal state or the single auto-submit attempt resolves.
/// Spawn this next to the UI loop and drop or close the handle to stop it.
///
/// Returns the auto-submit outcome when the timer fired, `Ok(None)` when the
/// session ended without expiring (submitted manually, torn down, or the
/// load failed).
///
/// # Errors
///
/// Returns `ExamSessionError::Submit` when the auto-submit failed; the
/// session stays interactive with the error recorded, and the countdown does
/// not re-fire.
pub async fn run_countdown(
    loop_svc: &ExamLoopService,
    handle: &SessionHandle,
    student: &StudentId,
) -> Result<Option<SubmitOutcome>, ExamSessionError> {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if handle.is_terminal() {
            return Ok(None);
        }

        match loop_svc.tick(handle, student).await {
            Ok(Some(outcome)) => return Ok(Some(outcome)),
            Ok(None) => {}
            Err(ExamSessionError::Closed) => return Ok(None),
            Err(err) => return Err(err),
        }
    }
}
