//! Couch Player - Playback Orchestration
//!
//! Playback state synchronization and playlist orchestration for
//! remote-driven displays.
//!
//! This crate provides:
//! - Equality-gated selectors (listeners only hear about real changes)
//! - Segmented playback store (time, playback, volume, display, tracks)
//! - Throttled time sync and buffered-range coverage
//! - Multi-rail playlist model with loop and cross-rail traversal
//! - Autoplay countdown engine with cancellable timers
//! - Per-item DRM resolution
//! - Backend adapter that checks capabilities up front
//! - Tokio driver for running a session off channels
//!
//! # Architecture
//!
//! Nothing here decodes media. The backend is an opaque
//! [`couch_core::MediaBackend`]; engines never sleep and instead expose
//! `poll(now)` so hosts (or [`driver::run_session`]) decide when time
//! passes.
//!
//! # Example: Playlist traversal
//!
//! ```rust
//! use couch_core::{PlaylistItem, PlaylistRail, RailType};
//! use couch_playback::Playlist;
//!
//! let item = |id: &str| PlaylistItem::new(id, id, format!("https://cdn.example.com/{id}.mpd"));
//!
//! let playlist = Playlist::with_rails(vec![
//!     PlaylistRail::new("a", "Up Next", RailType::Queue)
//!         .with_priority(0)
//!         .with_items(vec![item("1"), item("2")]),
//!     PlaylistRail::new("b", "Related", RailType::Related)
//!         .with_priority(1)
//!         .with_items(vec![item("3"), item("4")]),
//! ])
//! .unwrap();
//!
//! assert_eq!(playlist.next_item(&"2".into()).unwrap().id.as_str(), "3");
//! assert!(playlist.next_item(&"4".into()).is_none());
//! ```
//!
//! # Example: Autoplay
//!
//! ```rust
//! use couch_core::{PlaylistItem, PlaylistRail, RailType};
//! use couch_playback::{PlayerConfig, PlayerEvent, PlaylistSession};
//! use std::time::{Duration, Instant};
//!
//! let rail = PlaylistRail::new("up-next", "Up Next", RailType::Queue).with_items(vec![
//!     PlaylistItem::new("ep-1", "Episode 1", "https://cdn.example.com/ep-1.mpd"),
//!     PlaylistItem::new("ep-2", "Episode 2", "https://cdn.example.com/ep-2.mpd"),
//! ]);
//! let mut session = PlaylistSession::with_rails(&PlayerConfig::default(), vec![rail]).unwrap();
//!
//! let start = Instant::now();
//! session.play_item(&"ep-1".into()).unwrap();
//! session.on_item_end(start);
//! session.poll(start + Duration::from_secs(5));
//!
//! assert_eq!(session.current_item().unwrap().id.as_str(), "ep-2");
//! assert!(session
//!     .drain_events()
//!     .iter()
//!     .any(|e| matches!(e, PlayerEvent::AutoPlayStarted { countdown_secs: 5, .. })));
//! ```

pub mod autoplay;
pub mod config;
pub mod controller;
pub mod driver;
pub mod drm;
mod error;
pub mod events;
pub mod history;
pub mod media_session;
pub mod playlist;
pub mod selector;
pub mod session;
pub mod state;
pub mod store;
pub mod time_sync;
pub mod timer;

// Public exports
pub use autoplay::{AutoPlayEngine, AutoPlayPhase, AutoPlaySettings, AutoPlaySignal};
pub use config::PlayerConfig;
pub use controller::{ErrorHandler, MediaEvent, PlaybackController};
pub use driver::{run_session, SessionCommand};
pub use drm::DrmResolver;
pub use error::{PlaybackError, Result};
pub use events::PlayerEvent;
pub use history::History;
pub use media_session::MediaSession;
pub use playlist::{ItemUpdate, Playlist, PlaylistState, RailUpdate, TraversalOverride};
pub use selector::{Selector, SubscriptionId, Subscribers};
pub use session::PlaylistSession;
pub use state::{
    DisplaySnapshot, PlaybackFlags, PlaybackState, TimeSnapshot, TracksSnapshot, VolumeSnapshot,
};
pub use store::{PlaybackAction, PlaybackStore};
pub use time_sync::{buffered_percentage, TimeSync};
pub use timer::{TimerSlot, TimerTicket};
