mod confirm;
mod handle;
mod progress;
mod queries;
mod service;
mod ticker;
mod view;
mod workflow;

// Public API of the exam session subsystem.
pub use crate::error::ExamSessionError;
pub use confirm::{ConfirmAll, DeclineAll, SubmitConfirmation};
pub use handle::SessionHandle;
pub use progress::ExamProgress;
pub use service::{ExamSession, NavTarget};
pub use ticker::run_countdown;
pub use view::{ExamRedirect, SessionSnapshot, SessionView};
pub use workflow::{ExamLoopService, SubmitOutcome};
