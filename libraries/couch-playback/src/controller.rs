//! Backend adapter
//!
//! [`PlaybackController`] sits between the host and an opaque
//! [`MediaBackend`]. Host commands are forwarded to the backend; events the
//! backend raises are translated into store actions. State only changes in
//! response to backend events, never optimistically on command.

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::events::{EventQueue, PlayerEvent};
use crate::selector::{Selector, SubscriptionId};
use crate::state::{
    DisplaySnapshot, PlaybackFlags, PlaybackState, TimeSnapshot, TracksSnapshot, VolumeSnapshot,
};
use crate::store::{PlaybackAction, PlaybackStore};
use crate::time_sync::{buffered_percentage, TimeSync};
use couch_core::{BackendError, Capability, MediaBackend, MediaError, TimeRange, TrackKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Events raised by the media backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MediaEvent {
    Play,
    Pause,
    Ended,
    TimeUpdate { time: f64 },
    DurationChange { duration: f64 },
    VolumeChange { volume: f64, muted: bool },
    Progress { buffered: Vec<TimeRange> },
    Seeking,
    Seeked,
    Waiting,
    CanPlay,
    RateChange { rate: f64 },
    FullscreenChange { fullscreen: bool },
    EnterPictureInPicture,
    LeavePictureInPicture,
    TracksChanged,
    Error { error: MediaError },
}

impl MediaEvent {
    /// Events that stop the time source and must flush the throttle
    fn stops_time_source(&self) -> bool {
        matches!(self, Self::Pause | Self::Seeking | Self::Ended)
    }
}

/// Host callback for load and DRM failures
pub type ErrorHandler = Box<dyn FnMut(&MediaError)>;

/// Owns the backend and the playback store
pub struct PlaybackController<B: MediaBackend> {
    backend: B,
    store: PlaybackStore,
    time_sync: TimeSync,
    error_handler: Option<ErrorHandler>,
    events: EventQueue,
    destroyed: bool,
}

impl<B: MediaBackend> PlaybackController<B> {
    /// Wrap `backend` after checking it reports every required capability
    pub fn new(backend: B, config: &PlayerConfig) -> Result<Self> {
        verify_capabilities(&backend)?;
        Ok(Self {
            backend,
            store: PlaybackStore::new().with_time_tolerance(config.sync.time_tolerance),
            time_sync: TimeSync::new(config.time_update_window()),
            error_handler: None,
            events: EventQueue::new(),
            destroyed: false,
        })
    }

    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.error_handler = handler;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(PlaybackError::SessionClosed)
        } else {
            Ok(())
        }
    }

    // ===== Store access =====

    /// Dispatch an action directly
    pub fn dispatch(&mut self, action: PlaybackAction) -> Arc<PlaybackState> {
        self.store.dispatch(action)
    }

    pub fn state(&self) -> Arc<PlaybackState> {
        self.store.state()
    }

    pub fn store(&self) -> &PlaybackStore {
        &self.store
    }

    pub fn time(&self) -> TimeSnapshot {
        self.store.time()
    }

    pub fn playback(&self) -> PlaybackFlags {
        self.store.playback()
    }

    pub fn volume(&self) -> VolumeSnapshot {
        self.store.volume()
    }

    pub fn display(&self) -> DisplaySnapshot {
        self.store.display()
    }

    pub fn tracks(&self) -> TracksSnapshot {
        self.store.tracks()
    }

    /// Percentage of the media buffered around the playhead
    pub fn buffered_percentage(&self) -> f64 {
        let state = self.store.state();
        buffered_percentage(&state.buffered, state.current_time, state.duration)
    }

    pub fn subscribe<T: 'static>(
        &mut self,
        selector: Selector<PlaybackState, T>,
        listener: impl FnMut(&T) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(selector, listener)
    }

    pub fn subscribe_time(&mut self, listener: impl FnMut(&TimeSnapshot) + 'static) -> SubscriptionId {
        self.store.subscribe_time(listener)
    }

    pub fn subscribe_playback(
        &mut self,
        listener: impl FnMut(&PlaybackFlags) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe_playback(listener)
    }

    pub fn subscribe_volume(
        &mut self,
        listener: impl FnMut(&VolumeSnapshot) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe_volume(listener)
    }

    pub fn subscribe_display(
        &mut self,
        listener: impl FnMut(&DisplaySnapshot) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe_display(listener)
    }

    pub fn subscribe_tracks(
        &mut self,
        listener: impl FnMut(&TracksSnapshot) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe_tracks(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // ===== Host commands =====

    /// Start or resume playback
    ///
    /// A backend that refuses to play is reported as a load (or DRM) error
    /// through state and the error handler, not returned.
    pub fn play(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if let Err(err) = self.backend.play() {
            let media_error = match err {
                BackendError::Drm(message) => MediaError::drm(message),
                other => MediaError::load(other.to_string()),
            };
            self.report_error(media_error);
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.backend.pause()?)
    }

    pub fn seek(&mut self, time: f64) -> Result<()> {
        self.ensure_alive()?;
        if !time.is_finite() {
            return Err(couch_core::CoreError::invalid_input(format!("seek target {time}")).into());
        }
        Ok(self.backend.seek(time.max(0.0))?)
    }

    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.ensure_alive()?;
        if volume.is_nan() {
            return Err(couch_core::CoreError::invalid_input("volume is NaN").into());
        }
        Ok(self.backend.set_volume(volume.clamp(0.0, 1.0))?)
    }

    pub fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.backend.set_muted(muted)?)
    }

    pub fn toggle_mute(&mut self) -> Result<()> {
        let muted = self.store.state().muted;
        self.set_muted(!muted)
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        self.ensure_alive()?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(couch_core::CoreError::invalid_input(format!("playback rate {rate}")).into());
        }
        Ok(self.backend.set_playback_rate(rate)?)
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.store.state().fullscreen {
            Ok(self.backend.exit_fullscreen()?)
        } else {
            Ok(self.backend.enter_fullscreen()?)
        }
    }

    pub fn enter_picture_in_picture(&mut self) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.backend.enter_picture_in_picture()?)
    }

    pub fn exit_picture_in_picture(&mut self) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.backend.exit_picture_in_picture()?)
    }

    pub fn select_audio_track(&mut self, id: &str) -> Result<()> {
        self.ensure_alive()?;
        self.backend.select_audio_track(id)?;
        self.refresh_track_kind(TrackKind::Audio);
        Ok(())
    }

    pub fn select_video_track(&mut self, id: &str) -> Result<()> {
        self.ensure_alive()?;
        self.backend.select_video_track(id)?;
        self.refresh_track_kind(TrackKind::Video);
        Ok(())
    }

    /// `None` turns subtitles off
    pub fn select_text_track(&mut self, id: Option<&str>) -> Result<()> {
        self.ensure_alive()?;
        self.backend.select_text_track(id)?;
        self.refresh_track_kind(TrackKind::Text);
        Ok(())
    }

    /// Re-read every track list from the backend
    ///
    /// Unchanged lists do not notify track subscribers.
    pub fn refresh_tracks(&mut self) {
        for kind in [TrackKind::Audio, TrackKind::Video, TrackKind::Text] {
            self.refresh_track_kind(kind);
        }
    }

    fn refresh_track_kind(&mut self, kind: TrackKind) {
        let tracks = self.backend.tracks(kind);
        let action = match kind {
            TrackKind::Audio => PlaybackAction::SetAudioTracks(tracks),
            TrackKind::Video => PlaybackAction::SetVideoTracks(tracks),
            TrackKind::Text => PlaybackAction::SetTextTracks(tracks),
        };
        self.store.dispatch(action);
    }

    /// Prepare state for a new source
    ///
    /// Called when the host switches items, before the backend starts
    /// loading it. Ignored once destroyed.
    pub fn begin_load(&mut self) {
        if self.destroyed {
            debug!("ignoring load after destroy");
            return;
        }
        self.time_sync.reset();
        self.store.dispatch(PlaybackAction::SetEnded(false));
        self.store.dispatch(PlaybackAction::SetCurrentTime(0.0));
        self.store.dispatch(PlaybackAction::SetBuffered(Vec::new()));
        self.store.dispatch(PlaybackAction::SetLoading(true));
    }

    /// Record a load or DRM failure
    ///
    /// The error lands in state, is queued for the host and handed to the
    /// error handler. The store stays usable; the next successful load
    /// clears it.
    pub fn report_error(&mut self, media_error: MediaError) {
        warn!(kind = ?media_error.kind, message = %media_error.message, "media error");
        self.store.dispatch(PlaybackAction::SetLoading(false));
        self.store
            .dispatch(PlaybackAction::SetError(Some(media_error.clone())));
        if let Some(handler) = self.error_handler.as_mut() {
            handler(&media_error);
        }
        self.events.push(PlayerEvent::Error { error: media_error });
    }

    // ===== Backend events =====

    /// Translate one backend event into store actions
    pub fn handle_media_event(&mut self, event: MediaEvent, now: Instant) {
        if self.destroyed {
            debug!(?event, "ignoring media event after destroy");
            return;
        }

        if event.stops_time_source() {
            if let Some(time) = self.time_sync.flush(now) {
                self.store.dispatch(PlaybackAction::SetCurrentTime(time));
            }
        }

        match event {
            MediaEvent::Play => {
                self.store.dispatch(PlaybackAction::SetPaused(false));
                self.store.dispatch(PlaybackAction::SetEnded(false));
            }
            MediaEvent::Pause => {
                self.store.dispatch(PlaybackAction::SetPaused(true));
            }
            MediaEvent::Ended => {
                self.store.dispatch(PlaybackAction::SetEnded(true));
                self.store.dispatch(PlaybackAction::SetPaused(true));
            }
            MediaEvent::TimeUpdate { time } => {
                self.time_sync.on_time_update(time, now);
            }
            MediaEvent::DurationChange { duration } => {
                self.store.dispatch(PlaybackAction::SetDuration(duration));
            }
            MediaEvent::VolumeChange { volume, muted } => {
                self.store.dispatch(PlaybackAction::SetVolume(volume));
                self.store.dispatch(PlaybackAction::SetMuted(muted));
            }
            MediaEvent::Progress { buffered } => {
                self.store.dispatch(PlaybackAction::SetBuffered(buffered));
            }
            MediaEvent::Seeking => {
                self.store.dispatch(PlaybackAction::SetSeeking(true));
            }
            MediaEvent::Seeked => {
                self.store.dispatch(PlaybackAction::SetSeeking(false));
            }
            MediaEvent::Waiting => {
                self.store.dispatch(PlaybackAction::SetWaiting(true));
            }
            MediaEvent::CanPlay => {
                self.store.dispatch(PlaybackAction::SetLoading(false));
                self.store.dispatch(PlaybackAction::SetWaiting(false));
                if self.store.state().error.is_some() {
                    self.store.dispatch(PlaybackAction::SetError(None));
                }
            }
            MediaEvent::RateChange { rate } => {
                self.store.dispatch(PlaybackAction::SetPlaybackRate(rate));
            }
            MediaEvent::FullscreenChange { fullscreen } => {
                self.store.dispatch(PlaybackAction::SetFullscreen(fullscreen));
            }
            MediaEvent::EnterPictureInPicture => {
                self.store.dispatch(PlaybackAction::SetPictureInPicture(true));
            }
            MediaEvent::LeavePictureInPicture => {
                self.store
                    .dispatch(PlaybackAction::SetPictureInPicture(false));
            }
            MediaEvent::TracksChanged => self.refresh_tracks(),
            MediaEvent::Error { error } => self.report_error(error),
        }
    }

    /// Deliver a throttled time update if one is due
    pub fn poll(&mut self, now: Instant) {
        if let Some(time) = self.time_sync.poll(now) {
            self.store.dispatch(PlaybackAction::SetCurrentTime(time));
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.time_sync.next_deadline()
    }

    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.events.drain()
    }

    /// Cancel timers, drop listeners and release the backend
    ///
    /// Safe to call more than once; the backend is destroyed only the first
    /// time.
    pub fn destroy(&mut self) {
        self.time_sync.cancel();
        self.store.clear_subscribers();
        if !self.destroyed {
            self.destroyed = true;
            self.backend.destroy();
            debug!("backend destroyed");
        }
    }
}

impl<B: MediaBackend> std::fmt::Debug for PlaybackController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("store", &self.store)
            .field("time_sync", &self.time_sync)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

/// Check `backend` against [`Capability::REQUIRED`]
pub fn verify_capabilities(backend: &impl MediaBackend) -> Result<()> {
    let reported: BTreeSet<Capability> = backend.capabilities().into_iter().collect();
    let missing: Vec<Capability> = Capability::REQUIRED
        .iter()
        .copied()
        .filter(|capability| !reported.contains(capability))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        error!(?missing, "backend rejected");
        Err(PlaybackError::MissingCapabilities(missing))
    }
}
