use serde::{Deserialize, Serialize};

use crate::colors::darken;
use crate::config::CampaignConfig;
use crate::ownership::ResolvedOwnership;
use crate::tables::{PlayerDirectory, PoiMap};

/// Visual state of one territory on one map. Derived on every render, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDescriptor {
    pub territory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_name: Option<String>,
    pub is_recent: bool,
    /// Fill color: the owner's roster color, or the neutral color.
    pub color: String,
}

/// Border emphasis, highest priority first. Exactly one applies to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderTier {
    RecentChange,
    Owned,
    Unclaimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    Solid,
    Thick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBorder {
    pub color: String,
    pub style: BorderStyle,
}

impl CellDescriptor {
    pub fn is_poi(&self) -> bool {
        self.poi_name.is_some()
    }

    /// POI marker, shown whether or not the cell is owned.
    pub fn glyph<'a>(&self, config: &'a CampaignConfig) -> &'a str {
        if self.is_poi() {
            config.poi_symbol.as_str()
        } else {
            ""
        }
    }

    /// Hover text for the cell.
    pub fn note(&self) -> String {
        match (&self.poi_name, &self.owner) {
            (Some(poi), Some(owner)) => format!("📍 {poi}\nOwned by: {owner}"),
            (Some(poi), None) => format!("📍 {poi}\nNeutral (unclaimed)"),
            (None, Some(owner)) => format!("Territory: {}\nOwned by: {owner}", self.territory),
            (None, None) => String::new(),
        }
    }

    pub fn border_tier(&self) -> BorderTier {
        if self.is_recent {
            BorderTier::RecentChange
        } else if self.owner.is_some() {
            BorderTier::Owned
        } else {
            BorderTier::Unclaimed
        }
    }

    pub fn border(&self, config: &CampaignConfig) -> CellBorder {
        match self.border_tier() {
            BorderTier::RecentChange => CellBorder {
                color: config.recent_border_color.clone(),
                style: BorderStyle::Thick,
            },
            BorderTier::Owned => CellBorder {
                color: darken(&self.color),
                style: BorderStyle::Solid,
            },
            BorderTier::Unclaimed => CellBorder {
                color: config.unclaimed_border_color.clone(),
                style: BorderStyle::Solid,
            },
        }
    }
}

/// Dense `rows × cols` grid of cells for one map, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderGrid {
    pub rows: Vec<Vec<CellDescriptor>>,
}

impl RenderGrid {
    pub fn cell(&self, column: usize, row: usize) -> Option<&CellDescriptor> {
        self.rows.get(row)?.get(column)
    }

    pub fn find(&self, territory: &str) -> Option<&CellDescriptor> {
        self.cells().find(|cell| cell.territory == territory)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellDescriptor> {
        self.rows.iter().flatten()
    }
}

pub fn build_render_grid(
    config: &CampaignConfig,
    resolved: &ResolvedOwnership,
    pois: &PoiMap,
    directory: &PlayerDirectory,
) -> RenderGrid {
    let grid = &config.grid;
    let rows = (0..grid.rows)
        .map(|row| {
            (0..grid.cols)
                .filter_map(|column| grid.to_label(column, row))
                .map(|territory| {
                    let owner = resolved.owner_of(&territory).map(str::to_string);
                    let color = owner
                        .as_deref()
                        .and_then(|name| directory.color_of(name))
                        .unwrap_or(config.neutral_color.as_str())
                        .to_string();
                    CellDescriptor {
                        poi_name: pois.get(&territory).cloned(),
                        is_recent: resolved.is_recent(&territory),
                        owner,
                        color,
                        territory,
                    }
                })
                .collect()
        })
        .collect();

    RenderGrid { rows }
}
