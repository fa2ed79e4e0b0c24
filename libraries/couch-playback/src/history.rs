//! Watch history
//!
//! Bounded record of items that were played in this session, newest last.

use couch_core::{ItemId, PlaylistItem};
use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// Ring buffer of played items
#[derive(Debug, Clone)]
pub struct History {
    /// Most recent at the back
    items: VecDeque<PlaylistItem>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_size.min(DEFAULT_HISTORY_SIZE)),
            max_size,
        }
    }

    /// Record a played item, discarding the oldest entry when full
    ///
    /// Replaying the most recent item does not add a second entry.
    pub fn push(&mut self, item: PlaylistItem) {
        if self.max_size == 0 {
            return;
        }
        if self.items.back().is_some_and(|last| last.id == item.id) {
            self.items.pop_back();
        }
        if self.items.len() >= self.max_size {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn peek(&self) -> Option<&PlaylistItem> {
        self.items.back()
    }

    pub fn pop(&mut self) -> Option<PlaylistItem> {
        self.items.pop_back()
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.id == item_id)
    }

    /// Oldest first
    pub fn items(&self) -> impl DoubleEndedIterator<Item = &PlaylistItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Shrinking drops the oldest entries
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.items.len() > max_size {
            self.items.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
