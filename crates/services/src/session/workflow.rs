use std::sync::Arc;

use exam_core::model::{AttemptId, ExamId, StudentId, SubmissionPayload, SubmissionReceipt};
use exam_core::Clock;

use backend::{ExamCatalog, SubmissionGateway};

use super::confirm::SubmitConfirmation;
use super::handle::SessionHandle;
use super::queries::ExamQueries;
use super::service::ExamSession;
use crate::error::ExamSessionError;

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend accepted the submission; the session is terminal.
    Accepted(SubmissionReceipt),
    /// The confirmation policy declined; nothing changed.
    Declined,
    /// Another submit call already holds the slot.
    AlreadyInFlight,
    /// The attempt was already submitted earlier.
    AlreadySubmitted,
}

/// Pre-flight status read under the lock before asking for confirmation.
enum Gate {
    Submitted,
    InFlight,
    Proceed { unanswered: usize },
}

/// Outcome of claiming the submit slot after confirmation.
enum Claim {
    Submitted,
    InFlight,
    Claimed(ExamId, SubmissionPayload),
}

/// Orchestrates session load and submission against the backend.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    catalog: Arc<dyn ExamCatalog>,
    submissions: Arc<dyn SubmissionGateway>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn ExamCatalog>,
        submissions: Arc<dyn SubmissionGateway>,
    ) -> Self {
        Self {
            clock,
            catalog,
            submissions,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load the exam into the handle.
    ///
    /// Summary and questions are fetched concurrently and joined. On success
    /// the handle becomes ready with index 0, an empty answer map, a start
    /// time taken from the clock, and the hinted or generated attempt id. On
    /// failure the handle becomes failed (fatal; the caller should redirect
    /// to the dashboard). A handle that was closed while the load was in
    /// flight stays closed and the result is discarded.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Load` on fetch failures,
    /// `ExamSessionError::Empty` for an exam without questions,
    /// `ExamSessionError::AlreadyStarted` if the handle left the loading
    /// state, and `ExamSessionError::Closed` if it was torn down up front.
    pub async fn initialize(
        &self,
        handle: &SessionHandle,
        exam_id: &ExamId,
        attempt_hint: Option<AttemptId>,
    ) -> Result<(), ExamSessionError> {
        if handle.is_closed() {
            return Err(ExamSessionError::Closed);
        }
        if !handle.is_loading() {
            return Err(ExamSessionError::AlreadyStarted);
        }

        let (summary, questions) =
            match ExamQueries::load_exam(exam_id, self.catalog.as_ref()).await {
                Ok(loaded) => loaded,
                Err(err) => {
                    tracing::warn!(exam = %exam_id, error = %err, "exam load failed");
                    handle.install_failed(err.to_string());
                    return Err(err);
                }
            };

        let attempt_id = attempt_hint.unwrap_or_else(AttemptId::generate);
        let session =
            match ExamSession::new(summary, questions, attempt_id, self.clock.now()) {
                Ok(session) => session,
                Err(err) => {
                    handle.install_failed(err.to_string());
                    return Err(err);
                }
            };

        handle.install_ready(session);
        Ok(())
    }

    /// Manual submit entry point.
    ///
    /// Idempotent: while a submission is in flight, or once one has been
    /// accepted, further calls are no-ops. With unanswered questions the
    /// injected policy is consulted first; a decline aborts with no state
    /// change. On backend failure the session reverts to interactive with
    /// the error recorded, and the failure propagates.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Submit` on backend failure,
    /// `ExamSessionError::NotReady` / `ExamSessionError::Closed` when no
    /// interactive session is present.
    pub async fn submit(
        &self,
        handle: &SessionHandle,
        student: &StudentId,
        confirm: &dyn SubmitConfirmation,
    ) -> Result<SubmitOutcome, ExamSessionError> {
        self.submit_inner(handle, student, Some(confirm)).await
    }

    /// One countdown tick.
    ///
    /// Recomputes remaining time; the first tick at or past the deadline
    /// consumes the expiry trigger and submits through the same path as the
    /// manual action, with the confirmation prompt short-circuited (no
    /// interactive confirmation is possible on auto-submit). Every other
    /// tick is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Closed` after teardown and
    /// `ExamSessionError::Submit` when the auto-submit itself fails.
    pub async fn tick(
        &self,
        handle: &SessionHandle,
        student: &StudentId,
    ) -> Result<Option<SubmitOutcome>, ExamSessionError> {
        let now = self.clock.now();
        let fire = match handle.with_session(|session| session.take_expiry(now)) {
            Ok(fire) => fire,
            // Still loading, or load already failed: nothing to count down.
            Err(ExamSessionError::NotReady) => return Ok(None),
            Err(err) => return Err(err),
        };

        if !fire {
            return Ok(None);
        }

        tracing::info!("exam time expired, auto-submitting");
        let outcome = self.submit_inner(handle, student, None).await?;
        Ok(Some(outcome))
    }

    /// Shared submission path. `confirm` is `None` on auto-submit, which
    /// bypasses the unanswered-question prompt.
    async fn submit_inner(
        &self,
        handle: &SessionHandle,
        student: &StudentId,
        confirm: Option<&dyn SubmitConfirmation>,
    ) -> Result<SubmitOutcome, ExamSessionError> {
        // Pre-flight read; no mutation yet, so a decline leaves no trace.
        let gate = handle.with_session(|session| {
            if session.is_submitted() {
                Gate::Submitted
            } else if session.is_submitting() {
                Gate::InFlight
            } else {
                Gate::Proceed {
                    unanswered: session.unanswered_count(),
                }
            }
        })?;

        let unanswered = match gate {
            Gate::Submitted => return Ok(SubmitOutcome::AlreadySubmitted),
            Gate::InFlight => return Ok(SubmitOutcome::AlreadyInFlight),
            Gate::Proceed { unanswered } => unanswered,
        };

        if unanswered > 0 {
            if let Some(policy) = confirm {
                if !policy.confirm_unanswered(unanswered).await {
                    tracing::debug!(unanswered, "submission declined by confirmation policy");
                    return Ok(SubmitOutcome::Declined);
                }
            }
        }

        // Claim the slot. The confirmation await above ran unlocked, so
        // another handler may have won the race in the meantime.
        let now = self.clock.now();
        let claim = handle.with_session(|session| {
            if session.is_submitted() {
                Claim::Submitted
            } else if !session.begin_submit() {
                Claim::InFlight
            } else {
                Claim::Claimed(
                    session.summary().id.clone(),
                    session.prepare_payload(student, now),
                )
            }
        })?;

        let (exam_id, payload) = match claim {
            Claim::Submitted => return Ok(SubmitOutcome::AlreadySubmitted),
            Claim::InFlight => return Ok(SubmitOutcome::AlreadyInFlight),
            Claim::Claimed(exam_id, payload) => (exam_id, payload),
        };

        tracing::info!(
            exam = %exam_id,
            attempt = %payload.attempt_id,
            unanswered,
            time_spent_min = payload.time_spent_min,
            "submitting exam attempt"
        );

        match self.submissions.submit(&exam_id, &payload).await {
            Ok(receipt) => {
                // A handle closed during the await discards the receipt here.
                handle.with_session(|session| session.complete_submit(receipt.clone()))?;
                Ok(SubmitOutcome::Accepted(receipt))
            }
            Err(err) => {
                tracing::warn!(exam = %exam_id, error = %err, "exam submission failed");
                handle.with_session(|session| session.fail_submit(err.to_string()))?;
                Err(ExamSessionError::Submit(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::confirm::{ConfirmAll, DeclineAll};
    use crate::session::service::NavTarget;
    use crate::session::view::SessionView;
    use backend::{BackendError, InMemoryBackend};
    use exam_core::model::{
        AnswerValue, ExamSummary, QuestionDraft, QuestionId, SubmissionId,
    };
    use exam_core::time::{fixed_clock, fixed_now};

    fn seeded_backend(duration_min: u32) -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.insert_exam(
            ExamSummary::new(ExamId::new("e1"), "Midterm", duration_min),
            vec![
                QuestionDraft::default(),
                QuestionDraft::default(),
                QuestionDraft {
                    kind: Some(exam_core::model::QuestionType::Descriptive),
                    ..QuestionDraft::default()
                },
            ],
        );
        backend
    }

    fn service(backend: &InMemoryBackend) -> ExamLoopService {
        ExamLoopService::new(
            fixed_clock(),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
        )
    }

    async fn ready_handle(svc: &ExamLoopService) -> SessionHandle {
        let handle = SessionHandle::new();
        svc.initialize(&handle, &ExamId::new("e1"), Some(AttemptId::new("a1")))
            .await
            .unwrap();
        handle
    }

    #[tokio::test]
    async fn initialize_builds_ready_session() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        match handle.view(fixed_now()) {
            SessionView::Ready(snapshot) => {
                assert_eq!(snapshot.current_index, 0);
                assert_eq!(snapshot.total_questions, 3);
                assert_eq!(snapshot.answered, 0);
                assert_eq!(snapshot.attempt_id, AttemptId::new("a1"));
                assert_eq!(snapshot.remaining_label, "30:00");
            }
            other => panic!("expected ready view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn initialize_failure_is_fatal() {
        let backend = seeded_backend(30);
        backend.fail_summaries(true);
        let svc = service(&backend);

        let handle = SessionHandle::new();
        let err = svc
            .initialize(&handle, &ExamId::new("e1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ExamSessionError::Load(_)));
        assert!(matches!(
            handle.view(fixed_now()),
            SessionView::Failed { .. }
        ));
        assert!(handle.is_terminal());
    }

    #[tokio::test]
    async fn initialize_twice_is_rejected() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        let err = svc
            .initialize(&handle, &ExamId::new("e1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSessionError::AlreadyStarted));
    }

    #[tokio::test]
    async fn initialize_generates_attempt_id_without_hint() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = SessionHandle::new();
        svc.initialize(&handle, &ExamId::new("e1"), None)
            .await
            .unwrap();

        match handle.view(fixed_now()) {
            SessionView::Ready(snapshot) => {
                assert!(!snapshot.attempt_id.as_str().is_empty());
            }
            other => panic!("expected ready view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn declined_confirmation_changes_nothing() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        handle
            .record_answer(QuestionId::new("q1"), AnswerValue::option(2))
            .unwrap();
        handle.navigate(NavTarget::Index(1)).unwrap();

        let outcome = svc
            .submit(&handle, &StudentId::new("s1"), &DeclineAll)
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Declined);
        assert_eq!(backend.submission_count(), 0);
        match handle.view(fixed_now()) {
            SessionView::Ready(snapshot) => {
                assert!(!snapshot.submitting);
                assert_eq!(snapshot.current_index, 1);
                assert_eq!(snapshot.answered, 1);
            }
            other => panic!("expected ready view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fully_answered_submit_skips_confirmation() {
        let backend = seeded_backend(30);
        backend.set_receipt(
            ExamId::new("e1"),
            exam_core::model::SubmissionReceipt::new(3, 3, 100.0, SubmissionId::new("s"))
                .unwrap(),
        );
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        for id in ["q1", "q2", "q3"] {
            handle
                .record_answer(QuestionId::new(id), AnswerValue::text("done"))
                .unwrap();
        }

        // DeclineAll would reject any prompt; with nothing unanswered it is
        // never consulted.
        let outcome = svc
            .submit(&handle, &StudentId::new("s1"), &DeclineAll)
            .await
            .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert!(matches!(
            handle.view(fixed_now()),
            SessionView::Submitted(_)
        ));
        assert_eq!(backend.submission_count(), 1);
    }

    #[tokio::test]
    async fn failed_submission_keeps_session_interactive() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        handle
            .record_answer(QuestionId::new("q1"), AnswerValue::option(0))
            .unwrap();
        backend.fail_submissions(true);

        let err = svc
            .submit(&handle, &StudentId::new("s1"), &ConfirmAll)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExamSessionError::Submit(BackendError::Network(_))
        ));

        match handle.view(fixed_now()) {
            SessionView::Ready(snapshot) => {
                assert!(!snapshot.submitting);
                assert!(snapshot.error.is_some());
                assert_eq!(snapshot.answered, 1);
            }
            other => panic!("expected ready view, got {other:?}"),
        }

        // Retry is a fresh user action and succeeds once the backend does.
        backend.fail_submissions(false);
        let outcome = svc
            .submit(&handle, &StudentId::new("s1"), &ConfirmAll)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert_eq!(backend.submission_count(), 1);
    }

    #[tokio::test]
    async fn submit_after_submitted_is_a_noop() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        svc.submit(&handle, &StudentId::new("s1"), &ConfirmAll)
            .await
            .unwrap();
        let outcome = svc
            .submit(&handle, &StudentId::new("s1"), &ConfirmAll)
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::AlreadySubmitted);
        assert_eq!(backend.submission_count(), 1);
    }

    #[tokio::test]
    async fn expiry_tick_submits_without_confirmation() {
        let backend = seeded_backend(0);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        // Zero answered questions; the expiry path submits without asking.
        let outcome = svc.tick(&handle, &StudentId::new("s1")).await.unwrap();

        assert!(matches!(outcome, Some(SubmitOutcome::Accepted(_))));
        assert_eq!(backend.submission_count(), 1);
        let payload = &backend.submissions()[0].1;
        assert!(payload.answers.is_empty());
        assert_eq!(payload.time_spent_min, 0);
    }

    #[tokio::test]
    async fn ticks_before_expiry_do_nothing() {
        let backend = seeded_backend(30);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;

        assert_eq!(svc.tick(&handle, &StudentId::new("s1")).await.unwrap(), None);
        assert_eq!(backend.submission_count(), 0);
    }

    #[tokio::test]
    async fn failed_auto_submit_never_refires() {
        let backend = seeded_backend(0);
        backend.fail_submissions(true);
        let svc = service(&backend);
        let handle = ready_handle(&svc).await;
        let student = StudentId::new("s1");

        let err = svc.tick(&handle, &student).await.unwrap_err();
        assert!(matches!(err, ExamSessionError::Submit(_)));

        // Later ticks see a consumed trigger and stay quiet.
        for _ in 0..3 {
            assert_eq!(svc.tick(&handle, &student).await.unwrap(), None);
        }

        // Manual retry still works.
        backend.fail_submissions(false);
        let outcome = svc.submit(&handle, &student, &ConfirmAll).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert_eq!(backend.submission_count(), 1);
    }

    #[tokio::test]
    async fn tick_on_loading_handle_is_quiet() {
        let backend = seeded_backend(0);
        let svc = service(&backend);
        let handle = SessionHandle::new();

        assert_eq!(svc.tick(&handle, &StudentId::new("s1")).await.unwrap(), None);
    }
}
