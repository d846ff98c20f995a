use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::fmt;

use exam_core::model::{
    AnswerMap, AnswerValue, AttemptId, ExamSummary, Question, QuestionId, StudentId,
    SubmissionPayload, SubmissionReceipt, SubmittedAnswer,
};
use exam_core::time::{elapsed_whole_minutes, format_remaining, remaining_until};

use super::progress::ExamProgress;
use crate::error::ExamSessionError;

//
// ─── NAVIGATION ────────────────────────────────────────────────────────────────
//

/// Where to move the current-question pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Next,
    Previous,
    /// Direct jump from the question navigator. Valid regardless of how many
    /// questions have been answered.
    Index(usize),
}

//
// ─── EXAM SESSION ──────────────────────────────────────────────────────────────
//

/// In-memory state machine for one attempt at one exam.
///
/// Created already loaded: the summary and normalized questions come from the
/// load workflow. From there the session tracks answers, the current-question
/// pointer, the countdown deadline, and the submission lifecycle. All methods
/// are synchronous; callers serialize access (see `SessionHandle`).
pub struct ExamSession {
    summary: ExamSummary,
    questions: Vec<Question>,
    answers: AnswerMap,
    current: usize,
    started_at: DateTime<Utc>,
    attempt_id: AttemptId,
    submitting: bool,
    last_error: Option<String>,
    receipt: Option<SubmissionReceipt>,
    expiry_fired: bool,
}

impl ExamSession {
    /// Create a session over an already-normalized question set.
    ///
    /// `started_at` should come from the services layer clock; it never
    /// changes afterwards, and neither does `attempt_id`.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Empty` if no questions are provided.
    pub fn new(
        summary: ExamSummary,
        questions: Vec<Question>,
        attempt_id: AttemptId,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ExamSessionError> {
        if questions.is_empty() {
            return Err(ExamSessionError::Empty);
        }

        Ok(Self {
            summary,
            questions,
            answers: AnswerMap::new(),
            current: 0,
            started_at,
            attempt_id,
            submitting: false,
            last_error: None,
            receipt: None,
            expiry_fired: false,
        })
    }

    #[must_use]
    pub fn summary(&self) -> &ExamSummary {
        &self.summary
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // The constructor guarantees a non-empty list and navigation clamps.
        &self.questions[self.current]
    }

    //
    // ─── ANSWER CAPTURE ────────────────────────────────────────────────────────
    //

    /// Upsert the answer for a question.
    ///
    /// Capture is permissive: the value's shape is not checked against the
    /// question's declared type, and ids outside the question set are
    /// accepted too. Both are only inspected when the payload is assembled.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::AlreadySubmitted` once the attempt has
    /// reached its terminal state.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), ExamSessionError> {
        if self.is_submitted() {
            return Err(ExamSessionError::AlreadySubmitted);
        }
        self.answers.record(question_id, value);
        Ok(())
    }

    /// Move the current-question pointer, clamped to the valid range.
    pub fn navigate(&mut self, target: NavTarget) {
        let last = self.questions.len() - 1;
        self.current = match target {
            NavTarget::Next => (self.current + 1).min(last),
            NavTarget::Previous => self.current.saturating_sub(1),
            NavTarget::Index(index) => index.min(last),
        };
    }

    //
    // ─── DERIVED VALUES ────────────────────────────────────────────────────────
    //

    /// Number of questions with a non-blank recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| self.answers.is_answered(&question.id))
            .count()
    }

    /// Number of questions still missing, null, or blank-after-trim.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.questions.len() - self.answered_count()
    }

    /// Sum of points across the question set.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.questions
            .iter()
            .fold(0_u32, |acc, question| acc.saturating_add(question.points))
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        let answered = self.answered_count();
        let total = self.questions.len();
        ExamProgress {
            total,
            answered,
            unanswered: total - answered,
            total_points: self.total_points(),
            fully_answered: answered == total,
        }
    }

    //
    // ─── COUNTDOWN ─────────────────────────────────────────────────────────────
    //

    /// The instant the attempt runs out of time.
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + self.summary.duration()
    }

    /// Time left on the attempt, clamped at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        remaining_until(self.deadline(), now)
    }

    /// `MM:SS` countdown label for display.
    #[must_use]
    pub fn remaining_label(&self, now: DateTime<Utc>) -> String {
        format_remaining(self.remaining(now))
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline()
    }

    /// Consume the expiry trigger.
    ///
    /// Returns true exactly once: the first time the deadline has passed
    /// while no submission is in flight or completed. Every later call
    /// returns false, so however many ticks arrive after expiry, at most one
    /// auto-submit is ever started.
    pub fn take_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.expiry_fired || self.submitting || self.is_submitted() || !self.is_expired(now) {
            return false;
        }
        self.expiry_fired = true;
        true
    }

    //
    // ─── SUBMISSION LIFECYCLE ──────────────────────────────────────────────────
    //

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.receipt.is_some()
    }

    #[must_use]
    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    /// Message from the most recent failed submission, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Claim the single submission slot.
    ///
    /// Returns false while a submission is in flight or after one has
    /// completed; this is the idempotency guard shared by the manual submit
    /// action and the timer-driven auto-submit.
    pub fn begin_submit(&mut self) -> bool {
        if self.submitting || self.is_submitted() {
            return false;
        }
        self.submitting = true;
        self.last_error = None;
        true
    }

    /// Assemble the payload for the external submit call.
    ///
    /// Answers are emitted in exam question order, preserved exactly as
    /// recorded. Entries whose shape does not match the declared question
    /// type are kept (capture was permissive); entries for ids outside the
    /// question set are dropped. Both cases are logged.
    #[must_use]
    pub fn prepare_payload(&self, student: &StudentId, now: DateTime<Utc>) -> SubmissionPayload {
        let known: HashSet<&QuestionId> = self.questions.iter().map(|q| &q.id).collect();
        for (question_id, _) in self.answers.iter() {
            if !known.contains(question_id) {
                tracing::warn!(
                    question = %question_id,
                    "dropping answer for unknown question id"
                );
            }
        }

        let answers = self
            .questions
            .iter()
            .filter_map(|question| {
                let value = self.answers.get(&question.id)?;
                if !value.matches(question.kind) {
                    tracing::warn!(
                        question = %question.id,
                        "answer shape does not match declared question type"
                    );
                }
                Some(SubmittedAnswer {
                    question_id: question.id.clone(),
                    value: value.clone(),
                })
            })
            .collect();

        SubmissionPayload {
            attempt_id: self.attempt_id.clone(),
            student_id: student.clone(),
            answers,
            started_at: self.started_at,
            time_spent_min: elapsed_whole_minutes(self.started_at, now),
        }
    }

    /// Record an accepted submission; the session is terminal afterwards.
    pub fn complete_submit(&mut self, receipt: SubmissionReceipt) {
        self.submitting = false;
        self.receipt = Some(receipt);
    }

    /// Record a failed submission. The session stays interactive: answers,
    /// the pointer, and the attempt id are untouched, and the submit slot is
    /// released for a retry.
    pub fn fail_submit(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.last_error = Some(message.into());
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("exam", &self.summary.id)
            .field("attempt_id", &self.attempt_id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("submitting", &self.submitting)
            .field("submitted", &self.is_submitted())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
