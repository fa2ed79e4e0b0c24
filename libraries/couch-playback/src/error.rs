//! Error types for playback orchestration

use couch_core::{Capability, CoreError, ItemId, RailId};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No rail with this id
    #[error("Rail not found: {0}")]
    RailNotFound(RailId),

    /// No item with this id on any rail
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Rail id already present
    #[error("Duplicate rail: {0}")]
    DuplicateRail(RailId),

    /// Item id already present somewhere in the playlist
    #[error("Duplicate item: {0}")]
    DuplicateItem(ItemId),

    /// Index out of bounds
    #[error("Index {index} out of bounds for rail of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Backend does not implement every required capability
    #[error("Backend is missing required capabilities: {0:?}")]
    MissingCapabilities(Vec<Capability>),

    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] couch_core::BackendError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Selector read before it was ever evaluated against a source
    #[error("Selector read before it was bound to a state source")]
    SelectorUninitialized,

    /// Session already torn down
    #[error("Session closed")]
    SessionClosed,

    /// Value validation error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
