#![forbid(unsafe_code)]

pub mod error;
pub mod session;

pub use exam_core::Clock;

pub use error::ExamSessionError;

pub use session::{
    run_countdown, ConfirmAll, DeclineAll, ExamLoopService, ExamProgress, ExamRedirect,
    ExamSession, NavTarget, SessionHandle, SessionSnapshot, SessionView, SubmitConfirmation,
    SubmitOutcome,
};
