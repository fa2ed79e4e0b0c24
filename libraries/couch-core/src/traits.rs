/// Backend capability trait for Couch Player
use crate::types::{MediaTrack, TrackKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operation a media backend can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Play,
    Pause,
    Seek,
    SetVolume,
    SetMuted,
    SetPlaybackRate,
    Fullscreen,
    PictureInPicture,
    AudioTracks,
    VideoTracks,
    TextTracks,
    Destroy,
}

impl Capability {
    /// Capabilities a backend must report before a controller accepts it
    pub const REQUIRED: [Capability; 12] = [
        Capability::Play,
        Capability::Pause,
        Capability::Seek,
        Capability::SetVolume,
        Capability::SetMuted,
        Capability::SetPlaybackRate,
        Capability::Fullscreen,
        Capability::PictureInPicture,
        Capability::AudioTracks,
        Capability::VideoTracks,
        Capability::TextTracks,
        Capability::Destroy,
    ];

    /// Capability that lists and selects tracks of `kind`
    pub fn for_tracks(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Audio => Self::AudioTracks,
            TrackKind::Video => Self::VideoTracks,
            TrackKind::Text => Self::TextTracks,
        }
    }
}

/// Failure returned by a backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Source failed to load or start
    #[error("Load failed: {0}")]
    Load(String),

    /// Decryption setup rejected
    #[error("DRM failed: {0}")]
    Drm(String),

    /// Track id unknown to the backend
    #[error("Unknown track: {0}")]
    UnknownTrack(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Other(String),
}

/// Opaque media decode/streaming engine
///
/// The playback core never decodes anything itself. It calls these methods
/// in response to host commands and reacts to the events the backend raises.
///
/// All calls happen on one logical thread, so implementors do not need to be
/// `Send`.
pub trait MediaBackend {
    /// Operations this backend actually implements
    ///
    /// Checked once when a controller is constructed; a backend missing a
    /// required capability is rejected up front instead of failing per call.
    fn capabilities(&self) -> Vec<Capability>;

    /// Start or resume playback
    ///
    /// # Errors
    /// `BackendError::Load` when the source cannot be played,
    /// `BackendError::Drm` when decryption setup was rejected
    fn play(&mut self) -> Result<(), BackendError>;

    fn pause(&mut self) -> Result<(), BackendError>;

    /// Seek to `time` seconds from the start
    fn seek(&mut self, time: f64) -> Result<(), BackendError>;

    /// Set linear volume in `0.0..=1.0`
    fn set_volume(&mut self, volume: f64) -> Result<(), BackendError>;

    fn set_muted(&mut self, muted: bool) -> Result<(), BackendError>;

    fn set_playback_rate(&mut self, rate: f64) -> Result<(), BackendError>;

    fn enter_fullscreen(&mut self) -> Result<(), BackendError>;

    fn exit_fullscreen(&mut self) -> Result<(), BackendError>;

    fn enter_picture_in_picture(&mut self) -> Result<(), BackendError>;

    fn exit_picture_in_picture(&mut self) -> Result<(), BackendError>;

    fn audio_tracks(&self) -> Vec<MediaTrack>;

    fn video_tracks(&self) -> Vec<MediaTrack>;

    fn text_tracks(&self) -> Vec<MediaTrack>;

    fn select_audio_track(&mut self, id: &str) -> Result<(), BackendError>;

    fn select_video_track(&mut self, id: &str) -> Result<(), BackendError>;

    /// Select a text track, `None` disables subtitles
    fn select_text_track(&mut self, id: Option<&str>) -> Result<(), BackendError>;

    /// Release every resource held by the backend
    fn destroy(&mut self);

    /// Tracks of a given kind
    fn tracks(&self, kind: TrackKind) -> Vec<MediaTrack> {
        match kind {
            TrackKind::Audio => self.audio_tracks(),
            TrackKind::Video => self.video_tracks(),
            TrackKind::Text => self.text_tracks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_capabilities_are_distinct() {
        let mut required = Capability::REQUIRED.to_vec();
        required.sort();
        required.dedup();
        assert_eq!(required.len(), Capability::REQUIRED.len());
    }

    #[test]
    fn track_capability_mapping() {
        assert_eq!(Capability::for_tracks(TrackKind::Audio), Capability::AudioTracks);
        assert_eq!(Capability::for_tracks(TrackKind::Text), Capability::TextTracks);
    }
}
