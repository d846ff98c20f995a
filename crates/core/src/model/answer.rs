use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::QuestionId;
use crate::model::question::QuestionType;

//
// ─── ANSWER VALUE ──────────────────────────────────────────────────────────────
//

/// A recorded answer: a selected option index or a free-text response.
///
/// Capture is deliberately permissive. Any value may be stored against any
/// question regardless of its declared type; the mismatch is only observed
/// where the answers are consumed, at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Zero-based index into a question's option list.
    OptionIndex(u32),
    /// Free-text response.
    Text(String),
}

impl AnswerValue {
    /// Free-text helper.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Option-selection helper.
    #[must_use]
    pub fn option(index: u32) -> Self {
        Self::OptionIndex(index)
    }

    /// A text answer counts as blank when it trims to nothing.
    /// A selected option is never blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::OptionIndex(_) => false,
            AnswerValue::Text(text) => text.trim().is_empty(),
        }
    }

    /// Whether this value's shape matches the question's declared type.
    #[must_use]
    pub fn matches(&self, kind: QuestionType) -> bool {
        matches!(
            (self, kind),
            (AnswerValue::OptionIndex(_), QuestionType::MultipleChoice)
                | (AnswerValue::Text(_), QuestionType::Descriptive)
        )
    }
}

//
// ─── ANSWER MAP ────────────────────────────────────────────────────────────────
//

/// In-memory answers for one attempt, keyed by question id.
///
/// Mutated only through `record`; an entry is *answered* iff it exists and
/// is not blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<QuestionId, AnswerValue>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the answer for a question. Recording the same value twice
    /// leaves the map in the same state as recording it once.
    pub fn record(&mut self, question_id: QuestionId, value: AnswerValue) {
        self.0.insert(question_id, value);
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<&AnswerValue> {
        self.0.get(question_id)
    }

    /// True when a non-blank answer is recorded for the question.
    #[must_use]
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.0.get(question_id).is_some_and(|value| !value.is_blank())
    }

    /// Number of recorded entries, blank or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &AnswerValue)> {
        self.0.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
