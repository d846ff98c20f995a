use exam_core::model::{normalize_questions, ExamId, ExamSummary, Question};

use backend::ExamCatalog;

use crate::error::ExamSessionError;

/// Backend-facing load helpers for the session workflow.
pub(crate) struct ExamQueries;

impl ExamQueries {
    /// Fetch summary and question set concurrently and normalize.
    ///
    /// Both fetches are joined; either failure aborts the whole load
    /// (fail-fast, no partial results and no retries).
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Load` for any backend failure.
    pub(crate) async fn load_exam(
        exam_id: &ExamId,
        catalog: &dyn ExamCatalog,
    ) -> Result<(ExamSummary, Vec<Question>), ExamSessionError> {
        let (summary, drafts) = tokio::try_join!(
            catalog.fetch_summary(exam_id),
            catalog.fetch_questions(exam_id)
        )
        .map_err(ExamSessionError::Load)?;

        let questions = normalize_questions(drafts);
        tracing::debug!(
            exam = %exam_id,
            questions = questions.len(),
            duration_min = summary.duration_min,
            "loaded exam"
        );
        Ok((summary, questions))
    }
}
