//! Playback state and its observable channels

use crate::selector::{shallow_slice_eq, time_eq_within, Selector, TIME_TOLERANCE};
use couch_core::{MediaError, MediaTrack, TimeRange};
use serde::{Deserialize, Serialize};

/// Canonical media playback status
///
/// Owned by [`crate::PlaybackStore`] and only ever replaced wholesale by the
/// reducer, never written field by field from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    // Time
    pub current_time: f64,
    pub duration: f64,
    pub buffered: Vec<TimeRange>,

    // Volume
    /// Linear volume, 0.0-1.0
    pub volume: f64,
    pub muted: bool,

    // Playback flags
    pub paused: bool,
    pub ended: bool,
    pub loading: bool,
    pub seeking: bool,
    pub waiting: bool,

    // Display
    pub fullscreen: bool,
    pub picture_in_picture: bool,
    pub playback_rate: f64,
    pub error: Option<MediaError>,

    // Tracks
    pub audio_tracks: Vec<MediaTrack>,
    pub video_tracks: Vec<MediaTrack>,
    pub text_tracks: Vec<MediaTrack>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            buffered: Vec::new(),
            volume: 1.0,
            muted: false,
            paused: true,
            ended: false,
            loading: false,
            seeking: false,
            waiting: false,
            fullscreen: false,
            picture_in_picture: false,
            playback_rate: 1.0,
            error: None,
            audio_tracks: Vec::new(),
            video_tracks: Vec::new(),
            text_tracks: Vec::new(),
        }
    }
}

/// Time channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    pub current_time: f64,
    pub duration: f64,
    pub buffered: Vec<TimeRange>,
}

impl TimeSnapshot {
    /// Equal when times differ by less than `tolerance` and buffering matches
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        time_eq_within(self.current_time, other.current_time, tolerance)
            && time_eq_within(self.duration, other.duration, tolerance)
            && shallow_slice_eq(&self.buffered, &other.buffered)
    }
}

/// Playback flags channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackFlags {
    pub paused: bool,
    pub loading: bool,
    pub ended: bool,
    pub seeking: bool,
    pub waiting: bool,
}

/// Volume channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSnapshot {
    pub volume: f64,
    pub muted: bool,
}

/// Display channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub fullscreen: bool,
    pub picture_in_picture: bool,
    pub playback_rate: f64,
    pub error: Option<MediaError>,
}

/// Tracks channel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TracksSnapshot {
    pub audio: Vec<MediaTrack>,
    pub video: Vec<MediaTrack>,
    pub text: Vec<MediaTrack>,
}

impl TracksSnapshot {
    /// Element-wise comparison of all three lists
    pub fn shallow_eq(&self, other: &Self) -> bool {
        shallow_slice_eq(&self.audio, &other.audio)
            && shallow_slice_eq(&self.video, &other.video)
            && shallow_slice_eq(&self.text, &other.text)
    }
}

impl PlaybackState {
    pub fn time(&self) -> TimeSnapshot {
        TimeSnapshot {
            current_time: self.current_time,
            duration: self.duration,
            buffered: self.buffered.clone(),
        }
    }

    pub fn playback(&self) -> PlaybackFlags {
        PlaybackFlags {
            paused: self.paused,
            loading: self.loading,
            ended: self.ended,
            seeking: self.seeking,
            waiting: self.waiting,
        }
    }

    pub fn volume(&self) -> VolumeSnapshot {
        VolumeSnapshot {
            volume: self.volume,
            muted: self.muted,
        }
    }

    pub fn display(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            fullscreen: self.fullscreen,
            picture_in_picture: self.picture_in_picture,
            playback_rate: self.playback_rate,
            error: self.error.clone(),
        }
    }

    pub fn tracks(&self) -> TracksSnapshot {
        TracksSnapshot {
            audio: self.audio_tracks.clone(),
            video: self.video_tracks.clone(),
            text: self.text_tracks.clone(),
        }
    }
}

/// Selector factories, one per channel
pub mod channels {
    use super::*;

    /// Time channel, ignoring jitter below `tolerance` seconds
    pub fn time_with_tolerance(tolerance: f64) -> Selector<PlaybackState, TimeSnapshot> {
        Selector::with_equality(PlaybackState::time, move |a: &TimeSnapshot, b: &TimeSnapshot| {
            a.approx_eq(b, tolerance)
        })
    }

    pub fn time() -> Selector<PlaybackState, TimeSnapshot> {
        time_with_tolerance(TIME_TOLERANCE)
    }

    pub fn playback() -> Selector<PlaybackState, PlaybackFlags> {
        Selector::new(PlaybackState::playback)
    }

    pub fn volume() -> Selector<PlaybackState, VolumeSnapshot> {
        Selector::new(PlaybackState::volume)
    }

    pub fn display() -> Selector<PlaybackState, DisplaySnapshot> {
        Selector::new(PlaybackState::display)
    }

    pub fn tracks() -> Selector<PlaybackState, TracksSnapshot> {
        Selector::with_equality(PlaybackState::tracks, TracksSnapshot::shallow_eq)
    }
}
