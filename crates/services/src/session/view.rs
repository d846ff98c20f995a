use chrono::{DateTime, Duration, Utc};

use exam_core::model::{AttemptId, Question, SubmissionReceipt};

use super::service::ExamSession;

/// Read-only snapshot of a running attempt.
///
/// Presentation-agnostic apart from `remaining_label`, which is the one
/// derived display value the session owns (`MM:SS`); everything else is for
/// the UI to format as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub exam_title: String,
    pub attempt_id: AttemptId,

    pub current_index: usize,
    pub current_question: Question,
    pub total_questions: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub total_points: u32,

    pub remaining: Duration,
    pub remaining_label: String,
    pub expired: bool,

    pub submitting: bool,
    /// Message from the most recent failed submission, if any.
    pub error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub(crate) fn capture(session: &ExamSession, now: DateTime<Utc>) -> Self {
        let progress = session.progress();
        Self {
            exam_title: session.summary().title.clone(),
            attempt_id: session.attempt_id().clone(),
            current_index: session.current_index(),
            current_question: session.current_question().clone(),
            total_questions: progress.total,
            answered: progress.answered,
            unanswered: progress.unanswered,
            total_points: progress.total_points,
            remaining: session.remaining(now),
            remaining_label: session.remaining_label(now),
            expired: session.is_expired(now),
            submitting: session.is_submitting(),
            error: session.last_error().map(str::to_owned),
        }
    }
}

/// What the caller should render. Exactly one state holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    /// Initial data load in flight.
    Loading,
    /// The load failed; fatal, show the error with a retreat action.
    Failed { error: String },
    /// Interactive attempt.
    Ready(SessionSnapshot),
    /// Terminal success.
    Submitted(SubmissionReceipt),
    /// Torn down.
    Closed,
}

/// Navigation request for the routing layer, emitted on terminal success or
/// fatal load failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ExamRedirect {
    /// Show the results view for an accepted submission.
    Results(SubmissionReceipt),
    /// Retreat to the dashboard after a fatal load failure.
    Dashboard { error: String },
}

impl ExamRedirect {
    #[must_use]
    pub fn results(receipt: SubmissionReceipt) -> Self {
        Self::Results(receipt)
    }

    #[must_use]
    pub fn dashboard(error: impl Into<String>) -> Self {
        Self::Dashboard {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        AnswerValue, ExamId, ExamSummary, QuestionDraft, QuestionId, SubmissionId,
    };
    use exam_core::time::fixed_now;

    #[test]
    fn snapshot_captures_counts_and_countdown() {
        let mut session = ExamSession::new(
            ExamSummary::new(ExamId::new("e1"), "Biology Final", 30),
            vec![
                QuestionDraft::default().normalize(0),
                QuestionDraft::default().normalize(1),
            ],
            AttemptId::new("a1"),
            fixed_now(),
        )
        .unwrap();
        session
            .record_answer(QuestionId::new("q1"), AnswerValue::option(0))
            .unwrap();

        let snapshot =
            SessionSnapshot::capture(&session, fixed_now() + Duration::seconds(90));

        assert_eq!(snapshot.exam_title, "Biology Final");
        assert_eq!(snapshot.answered, 1);
        assert_eq!(snapshot.unanswered, 1);
        assert_eq!(snapshot.remaining_label, "28:30");
        assert!(!snapshot.expired);
        assert!(!snapshot.submitting);
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn redirect_constructors() {
        let receipt =
            exam_core::model::SubmissionReceipt::new(1, 2, 50.0, SubmissionId::new("s"))
                .unwrap();
        assert_eq!(
            ExamRedirect::results(receipt.clone()),
            ExamRedirect::Results(receipt)
        );
        assert!(matches!(
            ExamRedirect::dashboard("load failed"),
            ExamRedirect::Dashboard { .. }
        ));
    }
}
