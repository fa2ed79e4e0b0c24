/// DRM configuration types
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Widevine key system identifier
pub const KEY_SYSTEM_WIDEVINE: &str = "com.widevine.alpha";

/// PlayReady key system identifier
pub const KEY_SYSTEM_PLAYREADY: &str = "com.microsoft.playready";

/// FairPlay key system identifier
pub const KEY_SYSTEM_FAIRPLAY: &str = "com.apple.fps";

/// Clear Key key system identifier
pub const KEY_SYSTEM_CLEARKEY: &str = "org.w3.clearkey";

/// Decryption configuration for protected content
///
/// Compared by value: two configs with the same servers and parameters are
/// the same configuration even when they are different allocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmConfig {
    /// Key system identifier -> license server URL
    #[serde(default)]
    pub servers: BTreeMap<String, String>,

    /// Per key system advanced parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<BTreeMap<String, DrmAdvancedConfig>>,

    /// Clear Key map (key id -> key), both hex encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_keys: Option<BTreeMap<String, String>>,
}

/// Advanced parameters for a single key system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmAdvancedConfig {
    /// Base64 server certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_certificate: Option<String>,

    /// Extra headers sent with license requests
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub persistent_state_required: bool,

    #[serde(default)]
    pub distinctive_identifier_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_robustness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_robustness: Option<String>,
}

impl DrmConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a license server for a key system
    #[must_use]
    pub fn with_server(mut self, key_system: impl Into<String>, url: impl Into<String>) -> Self {
        self.servers.insert(key_system.into(), url.into());
        self
    }

    /// Add advanced parameters for a key system
    #[must_use]
    pub fn with_advanced(
        mut self,
        key_system: impl Into<String>,
        advanced: DrmAdvancedConfig,
    ) -> Self {
        self.advanced
            .get_or_insert_with(BTreeMap::new)
            .insert(key_system.into(), advanced);
        self
    }

    /// Add a Clear Key pair
    #[must_use]
    pub fn with_clear_key(mut self, key_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.clear_keys
            .get_or_insert_with(BTreeMap::new)
            .insert(key_id.into(), key.into());
        self
    }

    /// Parse a configuration from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// License server for a key system
    pub fn license_server(&self, key_system: &str) -> Option<&str> {
        self.servers.get(key_system).map(String::as_str)
    }

    /// Key systems this configuration can drive, in stable order
    pub fn key_systems(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    /// True when there is nothing to configure
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
            && self.clear_keys.as_ref().map_or(true, BTreeMap::is_empty)
    }
}
