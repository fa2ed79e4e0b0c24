//! Playlist orchestration
//!
//! [`PlaylistSession`] ties the playlist model to the autoplay engine and
//! the DRM resolver. Every item transition follows the same order: resolve
//! DRM (and report a change), switch the current item, then announce the
//! change and ask the host to play.

use crate::autoplay::{AutoPlayEngine, AutoPlayPhase, AutoPlaySignal};
use crate::config::PlayerConfig;
use crate::drm::DrmResolver;
use crate::error::{PlaybackError, Result};
use crate::events::{EventQueue, PlayerEvent};
use crate::history::History;
use crate::playlist::{ItemUpdate, Playlist, PlaylistState, RailUpdate, TraversalOverride};
use couch_core::{DrmConfig, ItemId, PlaylistItem, PlaylistRail, RailId};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Playlist, autoplay and DRM state for one player
#[derive(Debug)]
pub struct PlaylistSession {
    playlist: Playlist,
    autoplay: AutoPlayEngine,
    drm: DrmResolver,
    history: History,
    events: EventQueue,
    transitions: u64,
}

impl PlaylistSession {
    pub fn new(config: &PlayerConfig) -> Self {
        let settings = config.autoplay_settings();
        let mut playlist = Playlist::new().with_loop(config.playlist.loop_enabled);
        playlist.set_visible(config.playlist.visible);
        playlist.set_autoplay_enabled(settings.enabled);
        playlist.set_autoplay_countdown(settings.delay_secs);

        Self {
            playlist,
            autoplay: AutoPlayEngine::new(settings),
            drm: DrmResolver::new(config.drm.global.clone()),
            history: History::new(config.playlist.history_size),
            events: EventQueue::new(),
            transitions: 0,
        }
    }

    /// Session preloaded with rails
    pub fn with_rails(config: &PlayerConfig, rails: Vec<PlaylistRail>) -> Result<Self> {
        let mut session = Self::new(config);
        session.playlist.set_rails(rails)?;
        Ok(session)
    }

    // ===== Queries =====

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn state(&self) -> Arc<PlaylistState> {
        self.playlist.state()
    }

    pub fn current_item(&self) -> Option<&PlaylistItem> {
        self.playlist.current_item()
    }

    pub fn next_item(&self) -> Option<PlaylistItem> {
        self.playlist
            .current_item_id()
            .and_then(|id| self.playlist.next_item(id))
    }

    pub fn previous_item(&self) -> Option<PlaylistItem> {
        self.playlist
            .current_item_id()
            .and_then(|id| self.playlist.previous_item(id))
    }

    pub fn autoplay_phase(&self) -> AutoPlayPhase {
        self.autoplay.phase()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn applied_drm(&self) -> Option<&DrmConfig> {
        self.drm.applied()
    }

    /// Number of item transitions so far, replays included
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    // ===== Playlist editing =====

    fn playlist_changed(&mut self) {
        let state = self.playlist.state();
        self.events.push(PlayerEvent::PlaylistChanged {
            rails: state.rails.len(),
            items: state.item_count(),
        });
    }

    pub fn add_rail(&mut self, rail: PlaylistRail) -> Result<()> {
        self.playlist.add_rail(rail)?;
        self.playlist_changed();
        Ok(())
    }

    pub fn remove_rail(&mut self, rail_id: &RailId) -> Result<PlaylistRail> {
        let rail = self.playlist.remove_rail(rail_id)?;
        self.playlist_changed();
        Ok(rail)
    }

    pub fn update_rail(&mut self, rail_id: &RailId, changes: RailUpdate) -> Result<()> {
        self.playlist.update_rail(rail_id, changes)?;
        self.playlist_changed();
        Ok(())
    }

    pub fn set_rails(&mut self, rails: Vec<PlaylistRail>) -> Result<()> {
        self.playlist.set_rails(rails)?;
        self.playlist_changed();
        Ok(())
    }

    pub fn add_item(&mut self, rail_id: &RailId, item: PlaylistItem, index: Option<usize>) -> Result<()> {
        self.playlist.add_item(rail_id, item, index)?;
        self.playlist_changed();
        Ok(())
    }

    pub fn update_item(&mut self, rail_id: &RailId, item_id: &ItemId, changes: ItemUpdate) -> Result<()> {
        self.playlist.update_item(rail_id, item_id, changes)?;
        self.playlist_changed();
        Ok(())
    }

    pub fn remove_item(&mut self, rail_id: &RailId, item_id: &ItemId) -> Result<PlaylistItem> {
        let item = self.playlist.remove_item(rail_id, item_id)?;
        self.playlist_changed();
        Ok(item)
    }

    pub fn move_item(&mut self, rail_id: &RailId, from: usize, to: usize) -> Result<()> {
        self.playlist.move_item(rail_id, from, to)?;
        self.playlist_changed();
        Ok(())
    }

    pub fn toggle_rail_expansion(&mut self, rail_id: &RailId) -> Result<bool> {
        self.playlist.toggle_rail_expansion(rail_id)
    }

    pub fn set_active_rail(&mut self, rail_id: Option<&RailId>) -> Result<()> {
        self.playlist.set_active_rail(rail_id)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.playlist.set_visible(visible);
    }

    pub fn toggle_visibility(&mut self) -> bool {
        self.playlist.toggle_visibility()
    }

    pub fn set_loop(&mut self, loop_enabled: bool) {
        self.playlist.set_loop(loop_enabled);
    }

    pub fn set_next_override(&mut self, traverse: Option<TraversalOverride>) {
        self.playlist.set_next_override(traverse);
    }

    pub fn set_previous_override(&mut self, traverse: Option<TraversalOverride>) {
        self.playlist.set_previous_override(traverse);
    }

    /// Watch progress, clamped to 0-100
    pub fn update_item_progress(&mut self, item_id: &ItemId, progress: f64) -> Result<()> {
        self.playlist.update_item_progress(item_id, progress)
    }

    /// Replace the player-wide DRM fallback
    pub fn set_global_drm(&mut self, global: Option<DrmConfig>) {
        self.drm.set_global(global);
    }

    // ===== Transitions =====

    /// Make `item_id` current and ask the host to play it
    pub fn play_item(&mut self, item_id: &ItemId) -> Result<PlaylistItem> {
        let item = self
            .playlist
            .item(item_id)
            .cloned()
            .ok_or_else(|| PlaybackError::ItemNotFound(item_id.clone()))?;
        Ok(self.play_resolved(item))
    }

    /// Play the item after the current one
    ///
    /// With nothing current the first item of the playlist is played.
    /// Returns `None` when traversal is exhausted.
    pub fn play_next(&mut self) -> Option<PlaylistItem> {
        let next = match self.playlist.current_item_id() {
            Some(current) => self.playlist.next_item(current),
            None => self.playlist.state().items().next().cloned(),
        }?;
        Some(self.play_resolved(next))
    }

    /// Play the item before the current one, `None` when exhausted
    pub fn play_previous(&mut self) -> Option<PlaylistItem> {
        let current = self.playlist.current_item_id()?;
        let previous = self.playlist.previous_item(current)?;
        Some(self.play_resolved(previous))
    }

    fn play_resolved(&mut self, item: PlaylistItem) -> PlaylistItem {
        // A manual switch abandons any pending countdown without notifying
        if self.autoplay.is_counting_down() {
            debug!(item = %item.id, "countdown superseded by explicit play");
        }
        self.autoplay.supersede();
        self.playlist.set_next_item_id(None);
        self.playlist
            .set_autoplay_countdown(self.autoplay.settings().delay_secs);

        if let Some(drm) = self.drm.apply(&item) {
            self.events.push(PlayerEvent::DrmChanged { drm });
        }

        let previous_item_id = self.playlist.current_item_id().cloned();
        if !self.playlist.set_current_item(Some(&item.id)) {
            debug!(item = %item.id, "playing item outside the playlist");
        }
        let item = self.playlist.item(&item.id).cloned().unwrap_or(item);

        self.transitions += 1;
        info!(item = %item.id, previous = ?previous_item_id.as_ref().map(ItemId::as_str), "item changed");
        self.history.push(item.clone());
        self.events.push(PlayerEvent::ItemChanged {
            item_id: item.id.clone(),
            previous_item_id,
        });
        self.events.push(PlayerEvent::ItemPlay { item: item.clone() });
        item
    }

    /// The current item finished playing
    ///
    /// Arms the autoplay countdown when enabled and a next item exists. A
    /// repeated end while the countdown for the same successor is running
    /// is ignored.
    pub fn on_item_end(&mut self, now: Instant) {
        let Some(ended) = self.playlist.current_item().cloned() else {
            debug!("item end without a current item");
            return;
        };
        let next = self.playlist.next_item(&ended.id);
        let already_armed = self.autoplay.is_counting_down()
            && self
                .autoplay
                .target()
                .map(|target| &target.id)
                == next.as_ref().map(|item| &item.id);
        if already_armed {
            debug!(item = %ended.id, "duplicate item end during countdown");
            return;
        }
        self.events.push(PlayerEvent::ItemEnd {
            item: ended.clone(),
        });
        let signals = self.autoplay.on_item_end(now, next);
        self.apply_signals(signals);
    }

    /// Skip the rest of the countdown
    pub fn confirm_autoplay(&mut self) -> Option<PlaylistItem> {
        match self.autoplay.confirm()? {
            AutoPlaySignal::Play { item } => Some(self.play_resolved(item)),
            other => {
                self.apply_signals(vec![other]);
                None
            }
        }
    }

    /// Abandon the countdown; false if none was running
    pub fn cancel_autoplay(&mut self) -> bool {
        match self.autoplay.cancel() {
            Some(signal) => {
                self.apply_signals(vec![signal]);
                true
            }
            None => false,
        }
    }

    pub fn set_autoplay_enabled(&mut self, enabled: bool) {
        let cancelled = self.autoplay.set_enabled(enabled);
        self.playlist.set_autoplay_enabled(enabled);
        self.apply_signals(cancelled.into_iter().collect());
    }

    /// Fire due autoplay timers
    pub fn poll(&mut self, now: Instant) {
        let expected = self.playlist.state().next_item_id.clone();
        let signals = self.autoplay.poll(now, expected.as_ref());
        self.apply_signals(signals);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.autoplay.next_deadline()
    }

    fn apply_signals(&mut self, signals: Vec<AutoPlaySignal>) {
        for signal in signals {
            match signal {
                AutoPlaySignal::Started {
                    next,
                    countdown_secs,
                } => {
                    self.playlist.set_next_item_id(Some(next.id.clone()));
                    self.playlist.set_autoplay_countdown(countdown_secs);
                    self.events.push(PlayerEvent::AutoPlayStarted {
                        next,
                        countdown_secs,
                    });
                }
                AutoPlaySignal::Tick { remaining } => {
                    self.playlist.set_autoplay_countdown(remaining);
                    self.events.push(PlayerEvent::AutoPlayTick { remaining });
                }
                AutoPlaySignal::Cancelled { next } => {
                    self.playlist.set_next_item_id(None);
                    self.playlist
                        .set_autoplay_countdown(self.autoplay.settings().delay_secs);
                    self.events.push(PlayerEvent::AutoPlayCancelled { next });
                }
                AutoPlaySignal::Play { item } => {
                    self.play_resolved(item);
                }
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.events.drain()
    }

    /// Cancel every timer and drop listeners
    pub fn teardown(&mut self) {
        self.autoplay.teardown();
        self.playlist.set_next_item_id(None);
        self.playlist.clear_subscribers();
        debug!("playlist session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couch_core::RailType;
    use std::time::Duration;

    fn episode(id: &str) -> PlaylistItem {
        PlaylistItem::new(id, format!("Episode {id}"), format!("https://cdn.example.com/{id}.mpd"))
    }

    fn session() -> PlaylistSession {
        let rails = vec![
            PlaylistRail::new("up-next", "Up Next", RailType::Queue)
                .with_priority(0)
                .with_items(vec![episode("1"), episode("2")]),
            PlaylistRail::new("related", "Related", RailType::Related)
                .with_priority(1)
                .with_items(vec![episode("3")]),
        ];
        PlaylistSession::with_rails(&PlayerConfig::default(), rails).unwrap()
    }

    fn names(events: &[PlayerEvent]) -> Vec<&'static str> {
        events.iter().map(PlayerEvent::name).collect()
    }

    #[test]
    fn play_item_emits_changed_then_play() {
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.play_item(&"2".into()).unwrap();

        let events = session.drain_events();
        assert_eq!(
            names(&events),
            vec!["item_changed", "item_play", "item_changed", "item_play"]
        );
        assert_eq!(
            events[2],
            PlayerEvent::ItemChanged {
                item_id: "2".into(),
                previous_item_id: Some("1".into()),
            }
        );
        match &events[3] {
            PlayerEvent::ItemPlay { item } => assert!(item.is_active),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn play_unknown_item_fails() {
        let mut session = session();
        assert!(matches!(
            session.play_item(&"nope".into()),
            Err(PlaybackError::ItemNotFound(_))
        ));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn play_next_and_previous_walk_rails() {
        let mut session = session();
        assert_eq!(session.play_next().unwrap().id.as_str(), "1");
        assert_eq!(session.play_next().unwrap().id.as_str(), "2");
        assert_eq!(session.play_next().unwrap().id.as_str(), "3");
        assert!(session.play_next().is_none());
        assert_eq!(session.play_previous().unwrap().id.as_str(), "2");
    }

    #[test]
    fn item_end_counts_down_and_plays_next() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.drain_events();

        session.on_item_end(start);
        assert_eq!(session.state().next_item_id, Some("2".into()));
        for n in 1..=5 {
            session.poll(start + Duration::from_secs(n));
        }

        let events = session.drain_events();
        assert_eq!(
            names(&events),
            vec![
                "item_end",
                "autoplay_started",
                "autoplay_tick",
                "autoplay_tick",
                "autoplay_tick",
                "autoplay_tick",
                "autoplay_tick",
                "item_changed",
                "item_play",
            ]
        );
        assert_eq!(session.current_item().unwrap().id.as_str(), "2");
        assert!(session.state().next_item_id.is_none());
    }

    #[test]
    fn cancel_clears_next_reference() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.on_item_end(start);
        session.poll(start + Duration::from_secs(2));

        assert!(session.cancel_autoplay());
        assert!(!session.cancel_autoplay());
        assert!(session.state().next_item_id.is_none());
        assert_eq!(session.state().autoplay_countdown, 5);
        assert_eq!(session.autoplay_phase(), AutoPlayPhase::Cancelled);
        assert_eq!(session.current_item().unwrap().id.as_str(), "1");
    }

    #[test]
    fn removing_pending_item_makes_countdown_stale() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.on_item_end(start);
        session.remove_item(&"up-next".into(), &"2".into()).unwrap();
        session.drain_events();

        session.poll(start + Duration::from_secs(10));
        assert!(session.drain_events().is_empty());
        assert_eq!(session.current_item().unwrap().id.as_str(), "1");
        assert_eq!(session.autoplay_phase(), AutoPlayPhase::Idle);
    }

    #[test]
    fn confirm_plays_once() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.on_item_end(start);

        assert_eq!(session.confirm_autoplay().unwrap().id.as_str(), "2");
        assert!(session.confirm_autoplay().is_none());
        session.poll(start + Duration::from_secs(10));

        let plays = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, PlayerEvent::ItemPlay { .. }))
            .count();
        assert_eq!(plays, 2);
    }

    #[test]
    fn teardown_disarms_autoplay() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.on_item_end(start);
        session.teardown();

        assert!(session.next_deadline().is_none());
        session.drain_events();
        session.poll(start + Duration::from_secs(10));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn edits_announce_playlist_changes() {
        let mut session = session();
        session.add_item(&"related".into(), episode("4"), None).unwrap();
        assert_eq!(
            session.drain_events(),
            vec![PlayerEvent::PlaylistChanged { rails: 2, items: 4 }]
        );
    }

    #[test]
    fn repeated_item_end_during_countdown_is_ignored() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.drain_events();

        session.on_item_end(start);
        session.poll(start + Duration::from_secs(3));
        session.on_item_end(start + Duration::from_secs(3));
        assert_eq!(session.state().autoplay_countdown, 2);

        let events = session.drain_events();
        assert_eq!(
            names(&events),
            vec![
                "item_end",
                "autoplay_started",
                "autoplay_tick",
                "autoplay_tick",
                "autoplay_tick"
            ]
        );
    }

    #[test]
    fn confirmed_phase_lasts_until_next_item_end() {
        let start = Instant::now();
        let mut session = session();
        session.play_item(&"1".into()).unwrap();
        session.on_item_end(start);
        assert_eq!(session.confirm_autoplay().unwrap().id.as_str(), "2");
        assert_eq!(session.autoplay_phase(), AutoPlayPhase::Confirmed);

        session.on_item_end(start + Duration::from_secs(1));
        assert_eq!(session.autoplay_phase(), AutoPlayPhase::CountingDown);
    }

    #[test]
    fn confirm_returns_item_from_outside_playlist() {
        let start = Instant::now();
        let mut session = session();
        session.set_next_override(Some(Box::new(|_, _| Some(episode("bonus")))));
        session.play_item(&"1".into()).unwrap();
        session.on_item_end(start);

        let played = session.confirm_autoplay().unwrap();
        assert_eq!(played.id.as_str(), "bonus");
        assert!(session.current_item().is_none());
        assert_eq!(session.history().peek().unwrap().id.as_str(), "bonus");
    }
}
