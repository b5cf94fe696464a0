//! Client-side handling of the provider reply: fence stripping, parsing and
//! the upload view's state machine.

use std::cmp::Ordering;

use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use thiserror::Error;

const OPEN_FENCE: &str = "```json";
const CLOSE_FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Image upload failed")]
    UploadStatus(u16),
    #[error("Image upload failed")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response format")]
    Format,
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected a JSON object of scores")]
    NotAnObject,
}

/// Question identifier to score, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreMapping {
    entries: Vec<(String, String)>,
}

impl ScoreMapping {
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, score)| score.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `Question <id>: <score>` line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(question, score)| format!("Question {question}: {score}\n"))
            .collect()
    }
}

/// Removes a leading ```` ```json ```` and a trailing ```` ``` ````, then trims.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.strip_prefix(OPEN_FENCE).unwrap_or(text);
    let text = text.strip_suffix(CLOSE_FENCE).unwrap_or(text);
    text.trim()
}

/// Parses a provider reply into a score mapping. Scores are not validated.
pub fn parse_scores(result: &str) -> Result<ScoreMapping, ClientError> {
    let value: Value = serde_json::from_str(strip_code_fence(result))?;
    let Value::Object(map) = value else {
        return Err(ClientError::NotAnObject);
    };

    let mut entries: Vec<(String, String)> = map
        .into_iter()
        .map(|(question, score)| {
            let score = match score {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (question, score)
        })
        .collect();
    entries.sort_by(|(a, _), (b, _)| display_order(a, b));

    Ok(ScoreMapping { entries })
}

// Array-index keys ascending first, then the rest in reply order (sort is stable).
fn display_order(a: &str, b: &str) -> Ordering {
    match (array_index(a), array_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Canonical decimal below 2^32 - 1: no sign, no leading zero.
fn array_index(key: &str) -> Option<u32> {
    let canonical = key == "0"
        || (!key.starts_with('0') && !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()));
    if !canonical {
        return None;
    }
    key.parse::<u32>().ok().filter(|&index| index != u32::MAX)
}

/// A file chosen by the user, kept until replaced.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedImage {
    /// Local preview reference for immediate display.
    pub fn preview(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Ready,
    Loading,
}

/// State of the upload view: selected file, in-flight flag, displayed scores.
#[derive(Debug, Default)]
pub struct ScoreView {
    selected: Option<SelectedImage>,
    preview: Option<String>,
    loading: bool,
    scores: Option<ScoreMapping>,
    error: Option<String>,
}

impl ScoreView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        match (&self.selected, self.loading) {
            (_, true) => ViewState::Loading,
            (Some(_), false) => ViewState::Ready,
            (None, false) => ViewState::Idle,
        }
    }

    pub fn select(&mut self, image: SelectedImage) {
        self.preview = Some(image.preview());
        self.selected = Some(image);
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.loading
    }

    /// Enters Loading and hands out the image to upload, or does nothing.
    pub fn begin_submit(&mut self) -> Option<SelectedImage> {
        if !self.can_submit() {
            return None;
        }
        self.loading = true;
        self.error = None;
        self.selected.clone()
    }

    /// Leaves Loading. Success replaces the scores; failure clears them and
    /// records the message to surface.
    pub fn finish(&mut self, outcome: Result<ScoreMapping, ClientError>) {
        match outcome {
            Ok(scores) => {
                self.scores = Some(scores);
                self.error = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "Reading scores failed");
                self.scores = None;
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
    }

    pub fn scores(&self) -> Option<&ScoreMapping> {
        self.scores.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
