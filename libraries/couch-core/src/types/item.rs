/// Playlist item types
use crate::error::{CoreError, Result};
use crate::types::{DrmConfig, ItemId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A playable entry on a rail
///
/// Items are immutable values: playlist operations replace an item with a
/// new value rather than writing fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    /// Unique within the playlist
    pub id: ItemId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Thumbnail image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    /// Media source URL handed to the backend
    pub source: String,

    /// Item specific DRM, takes precedence over the global config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drm: Option<DrmConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<SubtitleTrack>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualities: Vec<QualityVariant>,

    /// Set only by the playlist when this item becomes current
    #[serde(default)]
    pub is_active: bool,

    /// Watched percentage (0-100)
    #[serde(default)]
    pub progress: f64,
}

/// Side-loaded subtitle track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// BCP 47 language tag
    pub language: String,
    pub label: String,
    pub url: String,
}

/// Alternative rendition of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVariant {
    pub label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl PlaylistItem {
    /// Create a new inactive item with no progress
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            thumbnail: None,
            duration: None,
            source: source.into(),
            drm: None,
            subtitles: Vec::new(),
            qualities: Vec::new(),
            is_active: false,
            progress: 0.0,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_drm(mut self, drm: DrmConfig) -> Self {
        self.drm = Some(drm);
        self
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: SubtitleTrack) -> Self {
        self.subtitles.push(subtitle);
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: QualityVariant) -> Self {
        self.qualities.push(quality);
        self
    }

    /// Validate and clamp a progress percentage into 0-100
    ///
    /// NaN is rejected; infinities clamp to the nearest bound.
    pub fn clamp_progress(progress: f64) -> Result<f64> {
        if progress.is_nan() {
            return Err(CoreError::InvalidProgress(progress));
        }
        Ok(progress.clamp(0.0, 100.0))
    }

    /// Copy of this item with a different active flag
    #[must_use]
    pub fn activated(&self, is_active: bool) -> Self {
        Self {
            is_active,
            ..self.clone()
        }
    }

    /// True once the item has been watched to the end
    pub fn is_completed(&self) -> bool {
        self.progress >= 100.0
    }
}
