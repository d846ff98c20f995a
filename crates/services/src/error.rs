//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;

/// Errors emitted by the exam session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamSessionError {
    #[error("exam has no questions")]
    Empty,

    #[error("session is not ready")]
    NotReady,

    #[error("session already initialized")]
    AlreadyStarted,

    #[error("exam already submitted")]
    AlreadySubmitted,

    #[error("session torn down")]
    Closed,

    #[error("failed to load exam: {0}")]
    Load(#[source] BackendError),

    #[error("failed to submit answers: {0}")]
    Submit(#[source] BackendError),
}
