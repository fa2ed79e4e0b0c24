//! Player events
//!
//! Notifications queued for the host. Events are emitted at:
//! - Item transitions (changed, play, end)
//! - Autoplay lifecycle (started, each countdown tick, cancelled)
//! - DRM configuration changes, resolved before the item changes
//! - Load and DRM failures
//! - Playlist edits made through the session

use couch_core::{DrmConfig, ItemId, MediaError, PlaylistItem};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Events emitted by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Autoplay countdown armed for `next`
    AutoPlayStarted {
        next: PlaylistItem,
        countdown_secs: u32,
    },

    /// One countdown second elapsed
    AutoPlayTick { remaining: u32 },

    /// Countdown abandoned, `next` will not be played
    AutoPlayCancelled { next: PlaylistItem },

    /// Host should start playback of `item`
    ItemPlay { item: PlaylistItem },

    /// `item` finished playing naturally
    ItemEnd { item: PlaylistItem },

    /// Current item switched
    ItemChanged {
        item_id: ItemId,
        previous_item_id: Option<ItemId>,
    },

    /// Effective DRM configuration changed; `None` means clear playback
    DrmChanged { drm: Option<DrmConfig> },

    /// Load or DRM failure reported by the backend
    Error { error: MediaError },

    /// Rails were added, removed or edited
    PlaylistChanged { rails: usize, items: usize },
}

impl PlayerEvent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::AutoPlayStarted { .. } => "autoplay_started",
            Self::AutoPlayTick { .. } => "autoplay_tick",
            Self::AutoPlayCancelled { .. } => "autoplay_cancelled",
            Self::ItemPlay { .. } => "item_play",
            Self::ItemEnd { .. } => "item_end",
            Self::ItemChanged { .. } => "item_changed",
            Self::DrmChanged { .. } => "drm_changed",
            Self::Error { .. } => "error",
            Self::PlaylistChanged { .. } => "playlist_changed",
        }
    }
}

/// FIFO of events waiting for the host
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<PlayerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PlayerEvent) {
        tracing::trace!(event = event.name(), "queued player event");
        self.events.push_back(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<PlayerEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
