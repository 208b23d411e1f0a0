use serde::{Deserialize, Serialize};

use crate::coords::GridDimensions;

pub const DEFAULT_RECENT_HIGHLIGHT_COUNT: usize = 3;
pub const DEFAULT_NEUTRAL_COLOR: &str = "#CCCCCC";
pub const DEFAULT_POI_SYMBOL: &str = "⌘";
pub const DEFAULT_POI_TEXT_COLOR: &str = "#FFFFFF";
pub const DEFAULT_RECENT_BORDER_COLOR: &str = "#000000";
pub const DEFAULT_UNCLAIMED_BORDER_COLOR: &str = "#AAAAAA";
/// Roster affiliation meaning "plays on every map".
pub const BOTH_MAPS_TAG: &str = "Both";

/// A named play surface with its own ownership state, POIs and starting snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub id: String,
    pub title: String,
}

impl MapDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Campaign-wide constants. Built once at startup and passed by reference; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub grid: GridDimensions,
    /// Size of the recent-change window.
    pub recent_highlight_count: usize,
    pub neutral_color: String,
    pub poi_symbol: String,
    pub poi_text_color: String,
    pub recent_border_color: String,
    pub unclaimed_border_color: String,
    pub maps: Vec<MapDefinition>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            grid: GridDimensions::default(),
            recent_highlight_count: DEFAULT_RECENT_HIGHLIGHT_COUNT,
            neutral_color: DEFAULT_NEUTRAL_COLOR.to_string(),
            poi_symbol: DEFAULT_POI_SYMBOL.to_string(),
            poi_text_color: DEFAULT_POI_TEXT_COLOR.to_string(),
            recent_border_color: DEFAULT_RECENT_BORDER_COLOR.to_string(),
            unclaimed_border_color: DEFAULT_UNCLAIMED_BORDER_COLOR.to_string(),
            maps: vec![
                MapDefinition::new("TGA", "TGA Map"),
                MapDefinition::new("Westgate", "Westgate Map"),
            ],
        }
    }
}

impl CampaignConfig {
    pub fn with_recent_highlight_count(mut self, count: usize) -> Self {
        self.recent_highlight_count = count;
        self
    }

    pub fn map(&self, id: &str) -> Option<&MapDefinition> {
        self.maps.iter().find(|map| map.id == id)
    }

    pub fn map_ids(&self) -> impl Iterator<Item = &str> {
        self.maps.iter().map(|map| map.id.as_str())
    }
}
