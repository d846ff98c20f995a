use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use exam_core::model::{AnswerValue, QuestionId};

use super::service::{ExamSession, NavTarget};
use super::view::{SessionSnapshot, SessionView};
use crate::error::ExamSessionError;

/// Lifecycle of a shared session slot. Exactly one variant holds at a time.
enum HandleState {
    /// The initial load is still in flight.
    Loading,
    Ready(ExamSession),
    /// The initial load failed; fatal, the caller should retreat.
    Failed(String),
    /// Torn down. Absorbs every later event, including in-flight results.
    Closed,
}

/// Cloneable owner of one exam session.
///
/// Event handlers (answer change, navigation, submit, timer tick) all go
/// through this handle and run one at a time; the lock is never held across
/// an await, so an in-flight load or submit leaves the session responsive.
/// `close` implements teardown: results that arrive afterwards are discarded
/// without touching state.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<HandleState>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// A fresh handle in the loading state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HandleState::Loading)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HandleState> {
        // Handlers are serialized; a poisoned lock means one of them
        // panicked, and the state it left behind is still the best answer.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only snapshot of the session for rendering.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        match &*self.lock() {
            HandleState::Loading => SessionView::Loading,
            HandleState::Failed(error) => SessionView::Failed {
                error: error.clone(),
            },
            HandleState::Closed => SessionView::Closed,
            HandleState::Ready(session) => match session.receipt() {
                Some(receipt) => SessionView::Submitted(receipt.clone()),
                None => SessionView::Ready(SessionSnapshot::capture(session, now)),
            },
        }
    }

    /// Record an answer for a question.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::NotReady` before the load resolves,
    /// `ExamSessionError::Closed` after teardown, and propagates session
    /// errors once terminal.
    pub fn record_answer(
        &self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), ExamSessionError> {
        self.with_session(|session| session.record_answer(question_id, value))?
    }

    /// Move the current-question pointer.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::NotReady` or `ExamSessionError::Closed`
    /// when no interactive session is present.
    pub fn navigate(&self, target: NavTarget) -> Result<(), ExamSessionError> {
        self.with_session(|session| session.navigate(target))
    }

    /// Tear the session down. Idempotent.
    pub fn close(&self) {
        *self.lock() = HandleState::Closed;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(&*self.lock(), HandleState::Closed)
    }

    /// True while the initial load has neither resolved nor failed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(&*self.lock(), HandleState::Loading)
    }

    /// True when no further events can affect the session: torn down,
    /// load-failed, or submitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match &*self.lock() {
            HandleState::Closed | HandleState::Failed(_) => true,
            HandleState::Ready(session) => session.is_submitted(),
            HandleState::Loading => false,
        }
    }

    /// Run a closure against the live session.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::NotReady` while loading or after a failed
    /// load, `ExamSessionError::Closed` after teardown.
    pub(crate) fn with_session<R>(
        &self,
        f: impl FnOnce(&mut ExamSession) -> R,
    ) -> Result<R, ExamSessionError> {
        match &mut *self.lock() {
            HandleState::Ready(session) => Ok(f(session)),
            HandleState::Loading | HandleState::Failed(_) => Err(ExamSessionError::NotReady),
            HandleState::Closed => Err(ExamSessionError::Closed),
        }
    }

    /// Install the loaded session. A handle that was closed (or already
    /// resolved) while the load was in flight discards the result.
    pub(crate) fn install_ready(&self, session: ExamSession) {
        let mut state = self.lock();
        if matches!(&*state, HandleState::Loading) {
            *state = HandleState::Ready(session);
        }
    }

    /// Install a fatal load failure, under the same staleness rule.
    pub(crate) fn install_failed(&self, error: String) {
        let mut state = self.lock();
        if matches!(&*state, HandleState::Loading) {
            *state = HandleState::Failed(error);
        }
    }
}
