//! Combined player session
//!
//! [`MediaSession`] pairs a [`PlaybackController`] with a
//! [`PlaylistSession`]: a backend `Ended` event feeds autoplay, and every
//! item switch resets the playback state for the incoming source.

use crate::config::PlayerConfig;
use crate::controller::{MediaEvent, PlaybackController};
use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::session::PlaylistSession;
use crate::timer::earliest;
use couch_core::{ItemId, MediaBackend, PlaylistItem, PlaylistRail};
use std::time::Instant;

/// Playback controller plus playlist orchestration
#[derive(Debug)]
pub struct MediaSession<B: MediaBackend> {
    controller: PlaybackController<B>,
    playlist: PlaylistSession,
}

impl<B: MediaBackend> MediaSession<B> {
    /// Fails when the backend lacks a required capability
    pub fn new(backend: B, config: &PlayerConfig) -> Result<Self> {
        Ok(Self {
            controller: PlaybackController::new(backend, config)?,
            playlist: PlaylistSession::new(config),
        })
    }

    pub fn with_rails(backend: B, config: &PlayerConfig, rails: Vec<PlaylistRail>) -> Result<Self> {
        Ok(Self {
            controller: PlaybackController::new(backend, config)?,
            playlist: PlaylistSession::with_rails(config, rails)?,
        })
    }

    pub fn controller(&self) -> &PlaybackController<B> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<B> {
        &mut self.controller
    }

    pub fn playlist(&self) -> &PlaylistSession {
        &self.playlist
    }

    /// Direct playlist access; item switches made through it do not reset
    /// playback state; prefer the transition methods on this type.
    pub fn playlist_mut(&mut self) -> &mut PlaylistSession {
        &mut self.playlist
    }

    /// Run a playlist operation and prepare the controller if it switched
    /// items
    fn transition<R>(&mut self, op: impl FnOnce(&mut PlaylistSession) -> R) -> R {
        let before = self.playlist.transition_count();
        let result = op(&mut self.playlist);
        if self.playlist.transition_count() != before {
            self.controller.begin_load();
        }
        result
    }

    /// Fails with [`PlaybackError::SessionClosed`] after teardown
    pub fn play_item(&mut self, item_id: &ItemId) -> Result<PlaylistItem> {
        if self.controller.is_destroyed() {
            return Err(PlaybackError::SessionClosed);
        }
        self.transition(|playlist| playlist.play_item(item_id))
    }

    /// `None` when traversal is exhausted or the session is torn down
    pub fn play_next(&mut self) -> Option<PlaylistItem> {
        if self.controller.is_destroyed() {
            return None;
        }
        self.transition(PlaylistSession::play_next)
    }

    pub fn play_previous(&mut self) -> Option<PlaylistItem> {
        if self.controller.is_destroyed() {
            return None;
        }
        self.transition(PlaylistSession::play_previous)
    }

    pub fn confirm_autoplay(&mut self) -> Option<PlaylistItem> {
        if self.controller.is_destroyed() {
            return None;
        }
        self.transition(PlaylistSession::confirm_autoplay)
    }

    pub fn cancel_autoplay(&mut self) -> bool {
        self.playlist.cancel_autoplay()
    }

    /// Feed a backend event; `Ended` also drives autoplay
    pub fn handle_media_event(&mut self, event: MediaEvent, now: Instant) {
        let ended = matches!(event, MediaEvent::Ended);
        self.controller.handle_media_event(event, now);
        if ended && !self.controller.is_destroyed() {
            self.transition(|playlist| playlist.on_item_end(now));
        }
    }

    /// Drive every timer that is due
    pub fn poll(&mut self, now: Instant) {
        self.controller.poll(now);
        self.transition(|playlist| playlist.poll(now));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.controller.next_deadline(), self.playlist.next_deadline()])
    }

    /// Controller events first, then playlist events
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        let mut events = self.controller.drain_events();
        events.extend(self.playlist.drain_events());
        events
    }

    /// Cancel every timer and destroy the backend
    pub fn teardown(&mut self) {
        self.playlist.teardown();
        self.controller.destroy();
    }
}
