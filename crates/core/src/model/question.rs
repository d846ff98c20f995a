use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// The two supported answer modes for a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Select one of several predefined options.
    #[default]
    MultipleChoice,
    /// Free-text response.
    Descriptive,
}

/// Optional media attached to a question prompt.
///
/// References whose URL fails to parse are dropped during normalization;
/// the question itself always survives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRefs {
    pub image: Option<Url>,
    pub video: Option<Url>,
    pub graph: Option<Url>,
}

impl MediaRefs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.video.is_none() && self.graph.is_none()
    }
}

//
// ─── DRAFT (unnormalized source shape) ─────────────────────────────────────────
//

/// Question as delivered by the backend, before normalization.
///
/// Every field may be missing; `normalize` applies the load-time defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionDraft {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QuestionType>,
    pub prompt: Option<String>,
    pub points: Option<u32>,
    pub options: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub graph_url: Option<String>,
}

fn parse_media_url(raw: Option<String>) -> Option<Url> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Url::parse(trimmed).ok()
}

impl QuestionDraft {
    /// Normalizes the draft into a `Question`, defaulting missing fields.
    ///
    /// `position` is the zero-based index in the fetched list; it seeds the
    /// synthesized ordinal id when the source omits one. Normalization never
    /// fails: a blank id, missing type, or zero points all fall back to the
    /// documented defaults.
    #[must_use]
    pub fn normalize(self, position: usize) -> Question {
        let id = match self.id {
            Some(raw) if !raw.trim().is_empty() => QuestionId::new(raw),
            _ => QuestionId::from_ordinal(position),
        };

        Question {
            id,
            kind: self.kind.unwrap_or_default(),
            prompt: self.prompt.unwrap_or_default(),
            points: self.points.unwrap_or(1).max(1),
            options: self.options.unwrap_or_default(),
            media: MediaRefs {
                image: parse_media_url(self.image_url),
                video: parse_media_url(self.video_url),
                graph: parse_media_url(self.graph_url),
            },
        }
    }
}

//
// ─── NORMALIZED QUESTION ───────────────────────────────────────────────────────
//

/// A question as held by a session. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub kind: QuestionType,
    pub prompt: String,
    /// Weight of this question; always >= 1.
    pub points: u32,
    /// Option texts, in display order. Meaningful for multiple-choice;
    /// kept as delivered otherwise.
    pub options: Vec<String>,
    pub media: MediaRefs,
}

impl Question {
    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionType::MultipleChoice
    }
}

/// Normalizes a fetched question list in order, applying per-position defaults.
#[must_use]
pub fn normalize_questions(drafts: Vec<QuestionDraft>) -> Vec<Question> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(position, draft)| draft.normalize(position))
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
