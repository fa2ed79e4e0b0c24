//! Couch Player Core
//!
//! Platform-agnostic value types, the media backend capability trait and
//! error handling shared by every Couch Player crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `PlaylistItem`, `PlaylistRail`, `DrmConfig`, `MediaTrack`, etc.
//! - **Backend Trait**: `MediaBackend`, the opaque decode/streaming engine
//! - **Error Handling**: `CoreError` for value validation, `MediaError` for
//!   failures reported by the backend
//!
//! # Example
//!
//! ```rust
//! use couch_core::types::{PlaylistItem, PlaylistRail, RailType};
//!
//! let item = PlaylistItem::new("ep-1", "Episode 1", "https://cdn.example.com/ep1.m3u8");
//! let rail = PlaylistRail::new("up-next", "Up Next", RailType::Queue)
//!     .with_priority(0)
//!     .with_items(vec![item]);
//!
//! assert_eq!(rail.items.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{BackendError, Capability, MediaBackend};

pub use types::{
    // Playlist
    ItemId, PlaylistItem, PlaylistRail, QualityVariant, RailId, RailType, SubtitleTrack,
    // DRM
    DrmAdvancedConfig, DrmConfig, KEY_SYSTEM_CLEARKEY, KEY_SYSTEM_FAIRPLAY, KEY_SYSTEM_PLAYREADY,
    KEY_SYSTEM_WIDEVINE,
    // Media
    MediaError, MediaErrorKind, MediaTrack, TimeRange, TrackKind,
};
