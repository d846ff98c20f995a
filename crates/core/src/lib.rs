#![forbid(unsafe_code)]

pub mod model;
pub mod time;

pub use time::Clock;

pub use model::{
    normalize_questions, AnswerMap, AnswerValue, AttemptId, ExamId, ExamSummary, MediaRefs,
    Question, QuestionDraft, QuestionId, QuestionType, ReceiptError, StudentId, SubmissionId,
    SubmissionPayload, SubmissionReceipt, SubmittedAnswer,
};
