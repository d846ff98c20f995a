use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use exam_core::model::{
    ExamId, ExamSummary, QuestionDraft, SubmissionId, SubmissionPayload, SubmissionReceipt,
};

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    #[error("exam not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("submission rejected: {0}")]
    Validation(String),
}

/// Read side of the exam backend: metadata and question sets.
#[async_trait]
pub trait ExamCatalog: Send + Sync {
    /// Fetch the summary for an exam.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the exam is unknown, or
    /// `BackendError::Network` on transport failures.
    async fn fetch_summary(&self, exam_id: &ExamId) -> Result<ExamSummary, BackendError>;

    /// Fetch the question set for an exam, in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Network` on transport failures.
    async fn fetch_questions(&self, exam_id: &ExamId)
        -> Result<Vec<QuestionDraft>, BackendError>;
}

/// Write side of the exam backend: attempt submission.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Post a finished attempt and receive the graded receipt.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` when the backend rejects the
    /// payload, or `BackendError::Network` on transport failures.
    async fn submit(
        &self,
        exam_id: &ExamId,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, BackendError>;
}

/// Aggregates both backend sides behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub catalog: Arc<dyn ExamCatalog>,
    pub submissions: Arc<dyn SubmissionGateway>,
}

impl Backend {
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = InMemoryBackend::new();
        let catalog: Arc<dyn ExamCatalog> = Arc::new(backend.clone());
        let submissions: Arc<dyn SubmissionGateway> = Arc::new(backend);
        Self {
            catalog,
            submissions,
        }
    }
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    summaries: HashMap<ExamId, ExamSummary>,
    questions: HashMap<ExamId, Vec<QuestionDraft>>,
    receipts: HashMap<ExamId, SubmissionReceipt>,
    submitted: Vec<(ExamId, SubmissionPayload)>,
    fail_summaries: bool,
    fail_questions: bool,
    fail_submissions: bool,
}

/// In-memory backend for testing and prototyping.
///
/// Exams are seeded up front; each call kind can be scripted to fail with a
/// network error, and every accepted submission is recorded so tests can
/// assert how many external calls were made.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an exam with its summary and raw question set.
    pub fn insert_exam(&self, summary: ExamSummary, questions: Vec<QuestionDraft>) {
        let mut state = self.lock();
        state.questions.insert(summary.id.clone(), questions);
        state.summaries.insert(summary.id.clone(), summary);
    }

    /// Fix the receipt returned for an exam's submissions. Without one, a
    /// zero-score receipt with a generated submission id is returned.
    pub fn set_receipt(&self, exam_id: ExamId, receipt: SubmissionReceipt) {
        self.lock().receipts.insert(exam_id, receipt);
    }

    /// Script summary fetches to fail with a network error.
    pub fn fail_summaries(&self, fail: bool) {
        self.lock().fail_summaries = fail;
    }

    /// Script question fetches to fail with a network error.
    pub fn fail_questions(&self, fail: bool) {
        self.lock().fail_questions = fail;
    }

    /// Script submissions to fail with a network error.
    pub fn fail_submissions(&self, fail: bool) {
        self.lock().fail_submissions = fail;
    }

    /// Number of submissions that reached the backend.
    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.lock().submitted.len()
    }

    /// Copies of every recorded submission, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<(ExamId, SubmissionPayload)> {
        self.lock().submitted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        // A poisoned lock only happens when a test panicked mid-call; the
        // remaining state is still the best answer available.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ExamCatalog for InMemoryBackend {
    async fn fetch_summary(&self, exam_id: &ExamId) -> Result<ExamSummary, BackendError> {
        let state = self.lock();
        if state.fail_summaries {
            return Err(BackendError::Network("summary fetch failed".into()));
        }
        state
            .summaries
            .get(exam_id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn fetch_questions(
        &self,
        exam_id: &ExamId,
    ) -> Result<Vec<QuestionDraft>, BackendError> {
        let state = self.lock();
        if state.fail_questions {
            return Err(BackendError::Network("question fetch failed".into()));
        }
        state
            .questions
            .get(exam_id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }
}

#[async_trait]
impl SubmissionGateway for InMemoryBackend {
    async fn submit(
        &self,
        exam_id: &ExamId,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, BackendError> {
        let mut state = self.lock();
        if state.fail_submissions {
            return Err(BackendError::Network("submission failed".into()));
        }

        state.submitted.push((exam_id.clone(), payload.clone()));
        tracing::debug!(
            exam = %exam_id,
            attempt = %payload.attempt_id,
            answers = payload.answers.len(),
            "recorded submission"
        );

        if let Some(receipt) = state.receipts.get(exam_id) {
            return Ok(receipt.clone());
        }
        SubmissionReceipt::new(
            0,
            0,
            0.0,
            SubmissionId::new(uuid::Uuid::new_v4().to_string()),
        )
        .map_err(|err| BackendError::Validation(err.to_string()))
    }
}
