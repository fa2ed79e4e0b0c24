//! Multi-rail playlist model and traversal
//!
//! Structure:
//! ```text
//! Rail "Up Next"   (priority 0):  [ep-1] [ep-2*] [ep-3]
//! Rail "Related"   (priority 1):  [r-1] [r-2]
//! Rail "Trending"  (priority 5):  (empty)
//! Rail "For You"   (priority 9):  [f-1]
//!                                   * current item, the only one marked active
//! ```
//!
//! Rails stay sorted by ascending priority. Next/previous walk items within
//! a rail first, then fall through to neighbouring non-empty rails, and
//! optionally wrap around when looping is enabled.

use crate::error::{PlaybackError, Result};
use crate::selector::{Selector, SubscriptionId, Subscribers};
use couch_core::{DrmConfig, ItemId, PlaylistItem, PlaylistRail, RailId, RailType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Complete playlist state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistState {
    pub current_item_id: Option<ItemId>,

    /// Sorted by ascending priority
    pub rails: Vec<PlaylistRail>,

    /// Whether the playlist overlay is shown
    pub visible: bool,

    pub expanded_rails: BTreeSet<RailId>,

    pub active_rail_id: Option<RailId>,

    pub autoplay_enabled: bool,

    /// Seconds left before the next item starts
    pub autoplay_countdown: u32,

    /// Item an armed autoplay countdown will start
    pub next_item_id: Option<ItemId>,
}

impl PlaylistState {
    /// Rail and item index of an item
    pub fn locate(&self, item_id: &ItemId) -> Option<(usize, usize)> {
        locate(&self.rails, item_id)
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&PlaylistItem> {
        self.locate(item_id)
            .map(|(rail, index)| &self.rails[rail].items[index])
    }

    pub fn rail(&self, rail_id: &RailId) -> Option<&PlaylistRail> {
        self.rails.iter().find(|rail| &rail.id == rail_id)
    }

    pub fn current_item(&self) -> Option<&PlaylistItem> {
        self.current_item_id.as_ref().and_then(|id| self.item(id))
    }

    pub fn is_expanded(&self, rail_id: &RailId) -> bool {
        self.expanded_rails.contains(rail_id)
    }

    /// Every item in traversal order
    pub fn items(&self) -> impl Iterator<Item = &PlaylistItem> {
        self.rails.iter().flat_map(|rail| rail.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.rails.iter().map(|rail| rail.items.len()).sum()
    }

    /// Items currently flagged active (at most one)
    pub fn active_items(&self) -> impl Iterator<Item = &PlaylistItem> {
        self.items().filter(|item| item.is_active)
    }
}

fn locate(rails: &[PlaylistRail], item_id: &ItemId) -> Option<(usize, usize)> {
    rails.iter().enumerate().find_map(|(rail_index, rail)| {
        rail.position_of(item_id)
            .map(|item_index| (rail_index, item_index))
    })
}

/// Item after `current` in rail-priority order
///
/// `rails` must be sorted by priority. Returns `None` when `current` is not
/// on any rail or nothing follows it.
pub fn next_item<'a>(
    rails: &'a [PlaylistRail],
    current: &ItemId,
    loop_enabled: bool,
) -> Option<&'a PlaylistItem> {
    let (rail_index, item_index) = locate(rails, current)?;

    if let Some(item) = rails[rail_index].items.get(item_index + 1) {
        return Some(item);
    }
    if let Some(item) = rails[rail_index + 1..]
        .iter()
        .find_map(|rail| rail.items.first())
    {
        return Some(item);
    }
    if !loop_enabled {
        return None;
    }
    // Wrap: earlier rails first, the current rail last
    rails[..=rail_index]
        .iter()
        .find_map(|rail| rail.items.first())
}

/// Item before `current` in rail-priority order, mirror of [`next_item`]
pub fn previous_item<'a>(
    rails: &'a [PlaylistRail],
    current: &ItemId,
    loop_enabled: bool,
) -> Option<&'a PlaylistItem> {
    let (rail_index, item_index) = locate(rails, current)?;

    if item_index > 0 {
        return rails[rail_index].items.get(item_index - 1);
    }
    if let Some(item) = rails[..rail_index]
        .iter()
        .rev()
        .find_map(|rail| rail.items.last())
    {
        return Some(item);
    }
    if !loop_enabled {
        return None;
    }
    rails[rail_index..]
        .iter()
        .rev()
        .find_map(|rail| rail.items.last())
}

/// Host supplied traversal, consulted before the default algorithm
pub type TraversalOverride = Box<dyn Fn(&PlaylistState, &ItemId) -> Option<PlaylistItem>>;

/// Partial rail update, `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct RailUpdate {
    pub title: Option<String>,
    pub rail_type: Option<RailType>,
    pub priority: Option<i32>,
    pub collapsible: Option<bool>,
    pub max_visible: Option<Option<usize>>,
}

/// Partial item update, `None` fields are left alone
///
/// Neither the id nor the active flag can be changed through an update.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub thumbnail: Option<Option<String>>,
    pub duration: Option<Option<Duration>>,
    pub source: Option<String>,
    pub drm: Option<Option<DrmConfig>>,
    pub progress: Option<f64>,
}

/// Playlist store
///
/// Every operation builds the next [`PlaylistState`] copy-on-write: snapshots
/// returned by [`Playlist::state`] are never modified afterwards.
pub struct Playlist {
    state: Arc<PlaylistState>,
    loop_enabled: bool,
    next_override: Option<TraversalOverride>,
    previous_override: Option<TraversalOverride>,
    subscribers: Subscribers<PlaylistState>,
}

impl Playlist {
    /// Create an empty playlist
    pub fn new() -> Self {
        Self {
            state: Arc::new(PlaylistState::default()),
            loop_enabled: false,
            next_override: None,
            previous_override: None,
            subscribers: Subscribers::new(),
        }
    }

    /// Create a playlist from rails, validating item uniqueness
    pub fn with_rails(rails: Vec<PlaylistRail>) -> Result<Self> {
        let mut playlist = Self::new();
        for rail in rails {
            playlist.add_rail(rail)?;
        }
        Ok(playlist)
    }

    #[must_use]
    pub fn with_loop(mut self, loop_enabled: bool) -> Self {
        self.loop_enabled = loop_enabled;
        self
    }

    pub fn state(&self) -> Arc<PlaylistState> {
        Arc::clone(&self.state)
    }

    pub fn rails(&self) -> &[PlaylistRail] {
        &self.state.rails
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&PlaylistItem> {
        self.state.item(item_id)
    }

    pub fn current_item(&self) -> Option<&PlaylistItem> {
        self.state.current_item()
    }

    pub fn current_item_id(&self) -> Option<&ItemId> {
        self.state.current_item_id.as_ref()
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop(&mut self, loop_enabled: bool) {
        self.loop_enabled = loop_enabled;
    }

    fn update(&mut self, edit: impl FnOnce(&mut PlaylistState) -> Result<()>) -> Result<()> {
        let mut next = (*self.state).clone();
        edit(&mut next)?;
        self.commit(next);
        Ok(())
    }

    fn commit(&mut self, next: PlaylistState) {
        let next = Arc::new(next);
        self.state = Arc::clone(&next);
        self.subscribers.notify_all(&next);
    }

    fn ensure_unique(state: &PlaylistState, items: &[PlaylistItem]) -> Result<()> {
        let mut seen = BTreeSet::new();
        for item in items {
            if state.locate(&item.id).is_some() || !seen.insert(&item.id) {
                return Err(PlaybackError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(())
    }

    fn rail_index(state: &PlaylistState, rail_id: &RailId) -> Result<usize> {
        state
            .rails
            .iter()
            .position(|rail| &rail.id == rail_id)
            .ok_or_else(|| PlaybackError::RailNotFound(rail_id.clone()))
    }

    fn sort_rails(state: &mut PlaylistState) {
        state.rails.sort_by_key(|rail| rail.priority);
    }

    // ===== Rails =====

    /// Insert a rail at its priority position
    ///
    /// Active flags on incoming items are normalized against the current
    /// item, since only [`Playlist::set_current_item`] decides activity.
    pub fn add_rail(&mut self, mut rail: PlaylistRail) -> Result<()> {
        self.update(|state| {
            if state.rail(&rail.id).is_some() {
                return Err(PlaybackError::DuplicateRail(rail.id.clone()));
            }
            Self::ensure_unique(state, &rail.items)?;
            for item in &mut rail.items {
                item.is_active = state.current_item_id.as_ref() == Some(&item.id);
            }
            state.rails.push(rail);
            Self::sort_rails(state);
            Ok(())
        })
    }

    /// Remove a rail with all its items
    pub fn remove_rail(&mut self, rail_id: &RailId) -> Result<PlaylistRail> {
        let mut removed = None;
        self.update(|state| {
            let index = Self::rail_index(state, rail_id)?;
            let rail = state.rails.remove(index);
            state.expanded_rails.remove(rail_id);
            if state.active_rail_id.as_ref() == Some(rail_id) {
                state.active_rail_id = None;
            }
            if state
                .current_item_id
                .as_ref()
                .is_some_and(|id| rail.contains(id))
            {
                state.current_item_id = None;
            }
            if state
                .next_item_id
                .as_ref()
                .is_some_and(|id| rail.contains(id))
            {
                state.next_item_id = None;
            }
            removed = Some(rail);
            Ok(())
        })?;
        removed.ok_or_else(|| PlaybackError::RailNotFound(rail_id.clone()))
    }

    pub fn update_rail(&mut self, rail_id: &RailId, changes: RailUpdate) -> Result<()> {
        self.update(|state| {
            let index = Self::rail_index(state, rail_id)?;
            let rail = &state.rails[index];
            let updated = PlaylistRail {
                title: changes.title.unwrap_or_else(|| rail.title.clone()),
                rail_type: changes.rail_type.unwrap_or(rail.rail_type),
                priority: changes.priority.unwrap_or(rail.priority),
                collapsible: changes.collapsible.unwrap_or(rail.collapsible),
                max_visible: changes.max_visible.unwrap_or(rail.max_visible),
                ..rail.clone()
            };
            state.rails[index] = updated;
            Self::sort_rails(state);
            Ok(())
        })
    }

    /// Replace every rail at once
    ///
    /// The current item survives when it is still present; the swap is a
    /// single commit, so subscribers never see rails and active flags out of
    /// step.
    pub fn set_rails(&mut self, rails: Vec<PlaylistRail>) -> Result<()> {
        let mut fresh = Self::new();
        for rail in rails {
            fresh.add_rail(rail)?;
        }
        self.update(|state| {
            state.rails = fresh.state.rails.clone();
            state.expanded_rails.retain(|id| fresh.state.rail(id).is_some());
            if state
                .active_rail_id
                .as_ref()
                .is_some_and(|id| fresh.state.rail(id).is_none())
            {
                state.active_rail_id = None;
            }
            if state
                .next_item_id
                .as_ref()
                .is_some_and(|id| state.locate(id).is_none())
            {
                state.next_item_id = None;
            }
            let current = state.current_item_id.clone();
            Self::activate(state, current.as_ref());
            Ok(())
        })
    }

    pub fn toggle_rail_expansion(&mut self, rail_id: &RailId) -> Result<bool> {
        let mut expanded = false;
        self.update(|state| {
            Self::rail_index(state, rail_id)?;
            expanded = if state.expanded_rails.remove(rail_id) {
                false
            } else {
                state.expanded_rails.insert(rail_id.clone());
                true
            };
            Ok(())
        })?;
        Ok(expanded)
    }

    pub fn set_active_rail(&mut self, rail_id: Option<&RailId>) -> Result<()> {
        self.update(|state| {
            if let Some(id) = rail_id {
                Self::rail_index(state, id)?;
            }
            state.active_rail_id = rail_id.cloned();
            Ok(())
        })
    }

    // ===== Items =====

    /// Insert an item, appending when `index` is `None`
    pub fn add_item(
        &mut self,
        rail_id: &RailId,
        mut item: PlaylistItem,
        index: Option<usize>,
    ) -> Result<()> {
        self.update(|state| {
            let rail_index = Self::rail_index(state, rail_id)?;
            Self::ensure_unique(state, std::slice::from_ref(&item))?;
            let len = state.rails[rail_index].items.len();
            let index = index.unwrap_or(len);
            if index > len {
                return Err(PlaybackError::IndexOutOfBounds { index, len });
            }
            item.is_active = state.current_item_id.as_ref() == Some(&item.id);
            state.rails[rail_index].items.insert(index, item);
            Ok(())
        })
    }

    pub fn update_item(
        &mut self,
        rail_id: &RailId,
        item_id: &ItemId,
        changes: ItemUpdate,
    ) -> Result<()> {
        let progress = changes
            .progress
            .map(PlaylistItem::clamp_progress)
            .transpose()?;
        self.update(|state| {
            let rail_index = Self::rail_index(state, rail_id)?;
            let rail = &mut state.rails[rail_index];
            let index = rail
                .position_of(item_id)
                .ok_or_else(|| PlaybackError::ItemNotFound(item_id.clone()))?;
            let item = &rail.items[index];
            let updated = PlaylistItem {
                title: changes.title.unwrap_or_else(|| item.title.clone()),
                description: changes
                    .description
                    .unwrap_or_else(|| item.description.clone()),
                thumbnail: changes.thumbnail.unwrap_or_else(|| item.thumbnail.clone()),
                duration: changes.duration.unwrap_or(item.duration),
                source: changes.source.unwrap_or_else(|| item.source.clone()),
                drm: changes.drm.unwrap_or_else(|| item.drm.clone()),
                progress: progress.unwrap_or(item.progress),
                ..item.clone()
            };
            rail.items[index] = updated;
            Ok(())
        })
    }

    /// Remove an item; removing the current item clears the current id
    pub fn remove_item(&mut self, rail_id: &RailId, item_id: &ItemId) -> Result<PlaylistItem> {
        let mut removed = None;
        self.update(|state| {
            let rail_index = Self::rail_index(state, rail_id)?;
            let rail = &mut state.rails[rail_index];
            let index = rail
                .position_of(item_id)
                .ok_or_else(|| PlaybackError::ItemNotFound(item_id.clone()))?;
            removed = Some(rail.items.remove(index));
            if state.current_item_id.as_ref() == Some(item_id) {
                state.current_item_id = None;
            }
            if state.next_item_id.as_ref() == Some(item_id) {
                state.next_item_id = None;
            }
            Ok(())
        })?;
        removed.ok_or_else(|| PlaybackError::ItemNotFound(item_id.clone()))
    }

    /// Move an item within one rail
    pub fn move_item(&mut self, rail_id: &RailId, from: usize, to: usize) -> Result<()> {
        self.update(|state| {
            let rail_index = Self::rail_index(state, rail_id)?;
            let items = &mut state.rails[rail_index].items;
            let len = items.len();
            for index in [from, to] {
                if index >= len {
                    return Err(PlaybackError::IndexOutOfBounds { index, len });
                }
            }
            if from != to {
                let item = items.remove(from);
                items.insert(to, item);
            }
            Ok(())
        })
    }

    /// Record watch progress for an item anywhere in the playlist
    pub fn update_item_progress(&mut self, item_id: &ItemId, progress: f64) -> Result<()> {
        let progress = PlaylistItem::clamp_progress(progress)?;
        self.update(|state| {
            let (rail_index, index) = state
                .locate(item_id)
                .ok_or_else(|| PlaybackError::ItemNotFound(item_id.clone()))?;
            let item = &state.rails[rail_index].items[index];
            state.rails[rail_index].items[index] = PlaylistItem {
                progress,
                ..item.clone()
            };
            Ok(())
        })
    }

    // ===== Current item =====

    /// Make `item_id` current and the only active item
    ///
    /// This is the sole writer of `is_active`. An unknown id (or `None`)
    /// leaves no item active and no current item. Returns whether the item
    /// was found.
    pub fn set_current_item(&mut self, item_id: Option<&ItemId>) -> bool {
        let mut next = (*self.state).clone();
        let found = Self::activate(&mut next, item_id);
        self.commit(next);
        found
    }

    /// Point `current_item_id` at `item_id` and rewrite every active flag
    fn activate(state: &mut PlaylistState, item_id: Option<&ItemId>) -> bool {
        let location = item_id.and_then(|id| state.locate(id));
        let found = location.is_some();
        for rail in &mut state.rails {
            for item in &mut rail.items {
                let active = found && Some(&item.id) == item_id;
                if item.is_active != active {
                    *item = item.activated(active);
                }
            }
        }
        state.current_item_id = if found { item_id.cloned() } else { None };
        if let Some((rail_index, _)) = location {
            state.active_rail_id = Some(state.rails[rail_index].id.clone());
        }
        found
    }

    // ===== Traversal =====

    /// Item after `current`, honoring a host override
    pub fn next_item(&self, current: &ItemId) -> Option<PlaylistItem> {
        if let Some(traverse) = &self.next_override {
            return traverse(&self.state, current);
        }
        next_item(&self.state.rails, current, self.loop_enabled).cloned()
    }

    /// Item before `current`, honoring a host override
    pub fn previous_item(&self, current: &ItemId) -> Option<PlaylistItem> {
        if let Some(traverse) = &self.previous_override {
            return traverse(&self.state, current);
        }
        previous_item(&self.state.rails, current, self.loop_enabled).cloned()
    }

    /// Replace the default next algorithm; takes precedence whenever set
    pub fn set_next_override(&mut self, traverse: Option<TraversalOverride>) {
        self.next_override = traverse;
    }

    /// Replace the default previous algorithm; takes precedence whenever set
    pub fn set_previous_override(&mut self, traverse: Option<TraversalOverride>) {
        self.previous_override = traverse;
    }

    // ===== Flags =====

    pub fn set_visible(&mut self, visible: bool) {
        self.edit_flags(|state| state.visible = visible);
    }

    pub fn toggle_visibility(&mut self) -> bool {
        let visible = !self.state.visible;
        self.set_visible(visible);
        visible
    }

    pub fn set_autoplay_enabled(&mut self, enabled: bool) {
        self.edit_flags(|state| state.autoplay_enabled = enabled);
    }

    pub fn set_autoplay_countdown(&mut self, seconds: u32) {
        self.edit_flags(|state| state.autoplay_countdown = seconds);
    }

    pub fn set_next_item_id(&mut self, item_id: Option<ItemId>) {
        self.edit_flags(|state| state.next_item_id = item_id);
    }

    fn edit_flags(&mut self, edit: impl FnOnce(&mut PlaylistState)) {
        let mut next = (*self.state).clone();
        edit(&mut next);
        if next != *self.state {
            self.commit(next);
        }
    }

    // ===== Observation =====

    pub fn subscribe<T: 'static>(
        &mut self,
        selector: Selector<PlaylistState, T>,
        listener: impl FnMut(&T) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(&self.state, selector, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playlist")
            .field("state", &self.state)
            .field("loop_enabled", &self.loop_enabled)
            .field("next_override", &self.next_override.is_some())
            .field("previous_override", &self.previous_override.is_some())
            .finish()
    }
}
