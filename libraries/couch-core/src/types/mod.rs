mod drm;
mod ids;
mod item;
mod media;
mod rail;

pub use drm::{
    DrmAdvancedConfig, DrmConfig, KEY_SYSTEM_CLEARKEY, KEY_SYSTEM_FAIRPLAY, KEY_SYSTEM_PLAYREADY,
    KEY_SYSTEM_WIDEVINE,
};
pub use ids::{ItemId, RailId};
pub use item::{PlaylistItem, QualityVariant, SubtitleTrack};
pub use media::{MediaError, MediaErrorKind, MediaTrack, TimeRange, TrackKind};
pub use rail::{PlaylistRail, RailType};
