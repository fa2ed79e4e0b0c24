//! DRM configuration resolution
//!
//! An item's own configuration wins over the player-wide one. The resolver
//! remembers what it last applied so hosts only hear about real changes.

use couch_core::{DrmConfig, PlaylistItem};
use tracing::debug;

/// Effective DRM configuration for an item
pub fn resolve<'a>(item: &'a PlaylistItem, global: Option<&'a DrmConfig>) -> Option<&'a DrmConfig> {
    item.drm.as_ref().or(global)
}

/// Tracks the applied DRM configuration across item changes
#[derive(Debug, Clone, Default)]
pub struct DrmResolver {
    global: Option<DrmConfig>,
    applied: Option<DrmConfig>,
}

impl DrmResolver {
    pub fn new(global: Option<DrmConfig>) -> Self {
        Self {
            global,
            applied: None,
        }
    }

    pub fn global(&self) -> Option<&DrmConfig> {
        self.global.as_ref()
    }

    /// Replace the player-wide configuration
    ///
    /// Takes effect on the next [`DrmResolver::apply`].
    pub fn set_global(&mut self, global: Option<DrmConfig>) {
        self.global = global;
    }

    /// Configuration currently applied to the player
    pub fn applied(&self) -> Option<&DrmConfig> {
        self.applied.as_ref()
    }

    /// Resolve for `item` and apply it
    ///
    /// Returns `Some(resolved)` only when the resolved value differs from
    /// what was applied before. Resolving to no configuration at all after a
    /// configured item counts as a change and yields `Some(None)`.
    pub fn apply(&mut self, item: &PlaylistItem) -> Option<Option<DrmConfig>> {
        let resolved = resolve(item, self.global.as_ref()).cloned();
        if resolved == self.applied {
            return None;
        }
        debug!(
            item = %item.id,
            key_systems = ?resolved.as_ref().map(|drm| drm.key_systems().collect::<Vec<_>>()),
            "DRM configuration changed"
        );
        self.applied.clone_from(&resolved);
        Some(resolved)
    }

    /// Forget the applied configuration, the next apply always reports
    pub fn reset(&mut self) {
        self.applied = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couch_core::{KEY_SYSTEM_PLAYREADY, KEY_SYSTEM_WIDEVINE};

    fn widevine(url: &str) -> DrmConfig {
        DrmConfig::new().with_server(KEY_SYSTEM_WIDEVINE, url)
    }

    fn plain(id: &str) -> PlaylistItem {
        PlaylistItem::new(id, id, format!("https://cdn.example.com/{id}.mpd"))
    }

    #[test]
    fn item_config_wins_over_global() {
        let global = widevine("https://license.example.com/global");
        let item = plain("a").with_drm(DrmConfig::new().with_server(KEY_SYSTEM_PLAYREADY, "https://pr"));

        assert_eq!(resolve(&item, Some(&global)), item.drm.as_ref());
        assert_eq!(resolve(&plain("b"), Some(&global)), Some(&global));
        assert_eq!(resolve(&plain("c"), None), None);
    }

    #[test]
    fn equal_configs_do_not_report_twice() {
        let mut resolver = DrmResolver::new(None);
        let a = plain("a").with_drm(widevine("https://lic/x"));
        let b = plain("b").with_drm(widevine("https://lic/x"));

        assert_eq!(resolver.apply(&a), Some(Some(widevine("https://lic/x"))));
        assert_eq!(resolver.apply(&b), None);
    }

    #[test]
    fn changed_server_reports_once() {
        let mut resolver = DrmResolver::new(None);
        resolver.apply(&plain("a").with_drm(widevine("https://lic/x")));

        let changed = resolver.apply(&plain("b").with_drm(widevine("https://lic/y")));
        assert_eq!(changed, Some(Some(widevine("https://lic/y"))));
        assert_eq!(resolver.applied(), Some(&widevine("https://lic/y")));
    }

    #[test]
    fn falling_back_to_nothing_is_a_change() {
        let mut resolver = DrmResolver::new(None);
        assert_eq!(resolver.apply(&plain("clear")), None);

        resolver.apply(&plain("a").with_drm(widevine("https://lic/x")));
        assert_eq!(resolver.apply(&plain("clear")), Some(None));
    }

    #[test]
    fn global_fallback_tracks_changes() {
        let mut resolver = DrmResolver::new(Some(widevine("https://lic/global")));
        assert!(resolver.apply(&plain("a")).is_some());
        assert!(resolver.apply(&plain("b")).is_none());

        resolver.set_global(Some(widevine("https://lic/rotated")));
        assert_eq!(
            resolver.apply(&plain("c")),
            Some(Some(widevine("https://lic/rotated")))
        );
    }
}
