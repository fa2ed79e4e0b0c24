//! Segmented playback store
//!
//! A single reducer over a closed set of actions. Every dispatch builds a
//! fresh [`PlaybackState`], swaps it in, and only then offers it to channel
//! selectors, so no observer ever sees a state half way between two
//! dispatches.

use crate::selector::{Selector, SubscriptionId, Subscribers};
use crate::state::{
    channels, DisplaySnapshot, PlaybackFlags, PlaybackState, TimeSnapshot, TracksSnapshot,
    VolumeSnapshot,
};
use couch_core::{MediaError, MediaTrack, TimeRange};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Every state mutation the store accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PlaybackAction {
    SetCurrentTime(f64),
    SetDuration(f64),
    SetVolume(f64),
    SetMuted(bool),
    SetPaused(bool),
    SetEnded(bool),
    SetBuffered(Vec<TimeRange>),
    SetLoading(bool),
    SetError(Option<MediaError>),
    SetFullscreen(bool),
    SetPictureInPicture(bool),
    SetPlaybackRate(f64),
    SetSeeking(bool),
    SetWaiting(bool),
    SetAudioTracks(Vec<MediaTrack>),
    SetVideoTracks(Vec<MediaTrack>),
    SetTextTracks(Vec<MediaTrack>),
    /// Back to defaults
    Reset,
}

/// Pure transition function
///
/// Out-of-range numbers are sanitized rather than rejected: volume clamps to
/// 0-1, times clamp at zero, and NaN or non-positive rates leave the old
/// value in place.
pub fn reduce(state: &PlaybackState, action: PlaybackAction) -> PlaybackState {
    let mut next = state.clone();
    match action {
        PlaybackAction::SetCurrentTime(time) => {
            if !time.is_nan() {
                next.current_time = time.max(0.0);
            }
        }
        PlaybackAction::SetDuration(duration) => {
            if !duration.is_nan() {
                next.duration = duration.max(0.0);
            }
        }
        PlaybackAction::SetVolume(volume) => {
            if !volume.is_nan() {
                next.volume = volume.clamp(0.0, 1.0);
            }
        }
        PlaybackAction::SetMuted(muted) => next.muted = muted,
        PlaybackAction::SetPaused(paused) => next.paused = paused,
        PlaybackAction::SetEnded(ended) => next.ended = ended,
        PlaybackAction::SetBuffered(buffered) => next.buffered = buffered,
        PlaybackAction::SetLoading(loading) => next.loading = loading,
        PlaybackAction::SetError(error) => next.error = error,
        PlaybackAction::SetFullscreen(fullscreen) => next.fullscreen = fullscreen,
        PlaybackAction::SetPictureInPicture(pip) => next.picture_in_picture = pip,
        PlaybackAction::SetPlaybackRate(rate) => {
            if rate.is_finite() && rate > 0.0 {
                next.playback_rate = rate;
            }
        }
        PlaybackAction::SetSeeking(seeking) => next.seeking = seeking,
        PlaybackAction::SetWaiting(waiting) => next.waiting = waiting,
        PlaybackAction::SetAudioTracks(tracks) => next.audio_tracks = tracks,
        PlaybackAction::SetVideoTracks(tracks) => next.video_tracks = tracks,
        PlaybackAction::SetTextTracks(tracks) => next.text_tracks = tracks,
        PlaybackAction::Reset => next = PlaybackState::default(),
    }
    next
}

/// Single source of truth for playback status
pub struct PlaybackStore {
    state: Arc<PlaybackState>,
    subscribers: Subscribers<PlaybackState>,
    revision: u64,
    time_tolerance: f64,
}

impl PlaybackStore {
    /// Create a store holding default state
    pub fn new() -> Self {
        Self::with_state(PlaybackState::default())
    }

    pub fn with_state(state: PlaybackState) -> Self {
        Self {
            state: Arc::new(state),
            subscribers: Subscribers::new(),
            revision: 0,
            time_tolerance: crate::selector::TIME_TOLERANCE,
        }
    }

    /// Tolerance used by [`Self::subscribe_time`] selectors created afterwards
    #[must_use]
    pub fn with_time_tolerance(mut self, tolerance: f64) -> Self {
        self.time_tolerance = tolerance;
        self
    }

    /// Apply `action` and notify affected channels
    ///
    /// The previous snapshot is never modified; callers holding it keep
    /// seeing the old values.
    pub fn dispatch(&mut self, action: PlaybackAction) -> Arc<PlaybackState> {
        trace!(?action, revision = self.revision, "dispatch");
        let next = Arc::new(reduce(&self.state, action));
        self.state = Arc::clone(&next);
        self.revision += 1;
        self.subscribers.notify_all(&next);
        next
    }

    /// Current full state
    pub fn state(&self) -> Arc<PlaybackState> {
        Arc::clone(&self.state)
    }

    /// Number of dispatches applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn time(&self) -> TimeSnapshot {
        self.state.time()
    }

    pub fn playback(&self) -> PlaybackFlags {
        self.state.playback()
    }

    pub fn volume(&self) -> VolumeSnapshot {
        self.state.volume()
    }

    pub fn display(&self) -> DisplaySnapshot {
        self.state.display()
    }

    pub fn tracks(&self) -> TracksSnapshot {
        self.state.tracks()
    }

    /// Observe an arbitrary projection of the state
    pub fn subscribe<T: 'static>(
        &mut self,
        selector: Selector<PlaybackState, T>,
        listener: impl FnMut(&T) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(&self.state, selector, listener)
    }

    pub fn subscribe_time(&mut self, listener: impl FnMut(&TimeSnapshot) + 'static) -> SubscriptionId {
        let selector = channels::time_with_tolerance(self.time_tolerance);
        self.subscribe(selector, listener)
    }

    pub fn subscribe_playback(
        &mut self,
        listener: impl FnMut(&PlaybackFlags) + 'static,
    ) -> SubscriptionId {
        self.subscribe(channels::playback(), listener)
    }

    pub fn subscribe_volume(
        &mut self,
        listener: impl FnMut(&VolumeSnapshot) + 'static,
    ) -> SubscriptionId {
        self.subscribe(channels::volume(), listener)
    }

    pub fn subscribe_display(
        &mut self,
        listener: impl FnMut(&DisplaySnapshot) + 'static,
    ) -> SubscriptionId {
        self.subscribe(channels::display(), listener)
    }

    pub fn subscribe_tracks(
        &mut self,
        listener: impl FnMut(&TracksSnapshot) + 'static,
    ) -> SubscriptionId {
        self.subscribe(channels::tracks(), listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Drop every listener (owning scope is going away)
    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for PlaybackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaybackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackStore")
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}
