use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::AnswerValue;
use crate::model::ids::{AttemptId, QuestionId, StudentId, SubmissionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReceiptError {
    #[error("score ({score}) exceeds max score ({max_score})")]
    ScoreExceedsMax { score: u32, max_score: u32 },
}

/// One answer as sent to the backend, in exam question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

/// Everything the backend needs to record one attempt's submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub attempt_id: AttemptId,
    pub student_id: StudentId,
    pub answers: Vec<SubmittedAnswer>,
    pub started_at: DateTime<Utc>,
    /// Elapsed attempt time in whole minutes, floored, never negative.
    pub time_spent_min: i64,
}

/// Grading result returned by the backend for an accepted submission.
///
/// Scoring happens server-side; this core never grades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    score: u32,
    max_score: u32,
    percentage: f64,
    submission_id: SubmissionId,
}

impl SubmissionReceipt {
    /// Builds a receipt from backend-provided values.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::ScoreExceedsMax` when the parts are
    /// inconsistent.
    pub fn new(
        score: u32,
        max_score: u32,
        percentage: f64,
        submission_id: SubmissionId,
    ) -> Result<Self, ReceiptError> {
        if score > max_score {
            return Err(ReceiptError::ScoreExceedsMax { score, max_score });
        }

        Ok(Self {
            score,
            max_score,
            percentage,
            submission_id,
        })
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn submission_id(&self) -> &SubmissionId {
        &self.submission_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_rejects_score_above_max() {
        let err =
            SubmissionReceipt::new(12, 10, 120.0, SubmissionId::new("s1")).unwrap_err();
        assert!(matches!(
            err,
            ReceiptError::ScoreExceedsMax {
                score: 12,
                max_score: 10
            }
        ));
    }

    #[test]
    fn receipt_exposes_parts() {
        let receipt = SubmissionReceipt::new(7, 10, 70.0, SubmissionId::new("s1")).unwrap();
        assert_eq!(receipt.score(), 7);
        assert_eq!(receipt.max_score(), 10);
        assert_eq!(receipt.percentage(), 70.0);
        assert_eq!(receipt.submission_id(), &SubmissionId::new("s1"));
    }
}
