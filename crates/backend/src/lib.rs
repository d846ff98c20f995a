#![forbid(unsafe_code)]

pub mod gateway;

pub use gateway::{
    Backend, BackendError, ExamCatalog, InMemoryBackend, SubmissionGateway,
};
