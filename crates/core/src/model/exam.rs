use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::model::ids::ExamId;

/// Exam metadata shown while an attempt is in progress. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub id: ExamId,
    pub title: String,
    /// Allowed attempt length in minutes. Zero means the attempt is
    /// expired from the moment it starts.
    pub duration_min: u32,
}

impl ExamSummary {
    #[must_use]
    pub fn new(id: ExamId, title: impl Into<String>, duration_min: u32) -> Self {
        Self {
            id,
            title: title.into(),
            duration_min,
        }
    }

    /// The attempt duration as a `chrono` duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_min))
    }
}
