/// Playlist rail types
use crate::types::{ItemId, PlaylistItem, RailId};
use serde::{Deserialize, Serialize};

/// Kind of rail, used by hosts for styling and by nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RailType {
    #[default]
    Queue,
    Related,
    Recommendations,
    History,
    Custom,
}

impl RailType {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Related => "related",
            Self::Recommendations => "recommendations",
            Self::History => "history",
            Self::Custom => "custom",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queue" => Some(Self::Queue),
            "related" => Some(Self::Related),
            "recommendations" => Some(Self::Recommendations),
            "history" => Some(Self::History),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for RailType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named, ordered, priority-ranked group of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRail {
    pub id: RailId,

    pub title: String,

    #[serde(rename = "type")]
    pub rail_type: RailType,

    /// Order is significant
    #[serde(default)]
    pub items: Vec<PlaylistItem>,

    /// Ascending sort key for display order and cross-rail traversal
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub collapsible: bool,

    /// Cap on items shown while collapsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_visible: Option<usize>,
}

impl PlaylistRail {
    /// Create an empty rail with priority 0
    pub fn new(id: impl Into<RailId>, title: impl Into<String>, rail_type: RailType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            rail_type,
            items: Vec::new(),
            priority: 0,
            collapsible: false,
            max_visible: None,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_items(mut self, items: Vec<PlaylistItem>) -> Self {
        self.items = items;
        self
    }

    #[must_use]
    pub fn collapsible(mut self, max_visible: usize) -> Self {
        self.collapsible = true;
        self.max_visible = Some(max_visible);
        self
    }

    /// Index of an item within this rail
    pub fn position_of(&self, item_id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == item_id)
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.position_of(item_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items a host should render, honoring the collapse cap
    pub fn visible_items(&self, expanded: bool) -> &[PlaylistItem] {
        match self.max_visible {
            Some(max) if self.collapsible && !expanded => &self.items[..max.min(self.items.len())],
            _ => &self.items,
        }
    }
}
