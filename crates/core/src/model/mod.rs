mod answer;
mod exam;
mod ids;
mod question;
mod submission;

pub use answer::{AnswerMap, AnswerValue};
pub use exam::ExamSummary;
pub use ids::{AttemptId, ExamId, QuestionId, StudentId, SubmissionId};
pub use question::{normalize_questions, MediaRefs, Question, QuestionDraft, QuestionType};
pub use submission::{ReceiptError, SubmissionPayload, SubmissionReceipt, SubmittedAnswer};
