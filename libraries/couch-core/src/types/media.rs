/// Media-level value types reported by the backend
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` interval of media time, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Create a validated range
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(CoreError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether `time` falls inside the range
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Kind of elementary stream a track belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
    Text,
}

/// Audio, video or text track exposed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    /// Backend specific track id
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether this track is the one currently selected
    #[serde(default)]
    pub selected: bool,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            language: None,
            selected: false,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// Category of a failure reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaErrorKind {
    /// Source could not be loaded or played
    Load,
    /// Decryption configuration rejected
    Drm,
}

/// Failure captured into playback state
///
/// This is state, not an exception channel: hosts read it from the display
/// channel and it is cleared by the next successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    pub kind: MediaErrorKind,
    pub message: String,
    /// Backend specific error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl MediaError {
    /// Create a load error
    pub fn load(message: impl Into<String>) -> Self {
        Self {
            kind: MediaErrorKind::Load,
            message: message.into(),
            code: None,
        }
    }

    /// Create a DRM error
    pub fn drm(message: impl Into<String>) -> Self {
        Self {
            kind: MediaErrorKind::Drm,
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MediaErrorKind::Load => write!(f, "Load error: {}", self.message),
            MediaErrorKind::Drm => write!(f, "DRM error: {}", self.message),
        }
    }
}
