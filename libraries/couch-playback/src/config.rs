/// Player configuration
use crate::autoplay::{AutoPlaySettings, DEFAULT_AUTOPLAY_DELAY_SECS};
use crate::error::{PlaybackError, Result};
use crate::history::DEFAULT_HISTORY_SIZE;
use crate::selector::TIME_TOLERANCE;
use couch_core::DrmConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub autoplay: AutoPlayConfig,

    #[serde(default)]
    pub playlist: PlaylistConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub drm: DrmSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AutoPlayConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between item end and next item start
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u32,

    #[serde(default = "default_enabled")]
    pub show_countdown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaylistConfig {
    #[serde(default)]
    pub loop_enabled: bool,

    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Initial overlay visibility
    #[serde(default)]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Minimum spacing of time dispatches
    #[serde(default = "default_time_update_window_ms")]
    pub time_update_window_ms: u64,

    /// Time deltas below this do not notify the time channel
    #[serde(default = "default_time_tolerance")]
    pub time_tolerance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DrmSettings {
    /// Applied to items without their own configuration
    #[serde(default)]
    pub global: Option<DrmConfig>,
}

impl PlayerConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `COUCH_` prefix with `__` between
    /// sections, e.g. `COUCH_AUTOPLAY__DELAY_SECS=10`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(true));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("COUCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sync.time_update_window_ms == 0 {
            return Err(PlaybackError::Config(
                "sync.time_update_window_ms must be greater than zero".to_string(),
            ));
        }

        if !self.sync.time_tolerance.is_finite() || self.sync.time_tolerance < 0.0 {
            return Err(PlaybackError::Config(format!(
                "sync.time_tolerance must be a non-negative number, got {}",
                self.sync.time_tolerance
            )));
        }

        Ok(())
    }

    pub fn time_update_window(&self) -> Duration {
        Duration::from_millis(self.sync.time_update_window_ms)
    }

    pub fn autoplay_settings(&self) -> AutoPlaySettings {
        AutoPlaySettings {
            enabled: self.autoplay.enabled,
            delay_secs: self.autoplay.delay_secs,
            show_countdown: self.autoplay.show_countdown,
        }
    }
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            delay_secs: default_delay_secs(),
            show_countdown: default_enabled(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            loop_enabled: false,
            history_size: default_history_size(),
            visible: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            time_update_window_ms: default_time_update_window_ms(),
            time_tolerance: default_time_tolerance(),
        }
    }
}

// Default values
fn default_enabled() -> bool {
    true
}

fn default_delay_secs() -> u32 {
    DEFAULT_AUTOPLAY_DELAY_SECS
}

fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

fn default_time_update_window_ms() -> u64 {
    100
}

fn default_time_tolerance() -> f64 {
    TIME_TOLERANCE
}
