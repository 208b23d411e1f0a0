use serde::{Deserialize, Serialize};

use crate::config::{CampaignConfig, MapDefinition};
use crate::grid::{CellBorder, CellDescriptor, RenderGrid, build_render_grid};
use crate::legend::{LegendEntry, build_legend};
use crate::ownership::{ResolvedOwnership, resolve_ownership};
use crate::tables::CampaignTables;

/// A cell as handed to a renderer: the derived state plus every display decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    #[serde(flatten)]
    pub cell: CellDescriptor,
    pub glyph: String,
    pub note: String,
    pub border: CellBorder,
}

impl CellView {
    pub fn new(cell: CellDescriptor, config: &CampaignConfig) -> Self {
        Self {
            glyph: cell.glyph(config).to_string(),
            note: cell.note(),
            border: cell.border(config),
            cell,
        }
    }
}

/// Complete visual description of one map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRender {
    pub map: String,
    pub title: String,
    pub column_headers: Vec<String>,
    pub row_headers: Vec<u32>,
    pub text_color: String,
    pub cells: Vec<Vec<CellView>>,
    pub legend: Vec<LegendEntry>,
    pub recent_changes: Vec<String>,
}

impl MapRender {
    pub fn cell(&self, territory: &str) -> Option<&CellView> {
        self.cells
            .iter()
            .flatten()
            .find(|view| view.cell.territory == territory)
    }

    pub fn owned_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|view| view.cell.owner.is_some())
            .count()
    }

    /// CRC32 of the serialized render. Equal renders hash equal.
    pub fn fingerprint(&self) -> u32 {
        serde_json::to_vec(self)
            .map(|bytes| fingerprint_bytes(&bytes))
            .unwrap_or_default()
    }
}

/// Fingerprint of an already-serialized render.
pub fn fingerprint_bytes(json: &[u8]) -> u32 {
    crc32fast::hash(json)
}

/// Resolve ownership for `map` from the tables.
pub fn resolve_map(
    config: &CampaignConfig,
    tables: &CampaignTables,
    map: &MapDefinition,
) -> ResolvedOwnership {
    let starting = tables.starting_owners(config, &map.id);
    resolve_ownership(
        &starting,
        &tables.results,
        &map.id,
        config.recent_highlight_count,
    )
}

/// Full pipeline for one map: resolve ownership, build the grid, build the legend.
pub fn render_map(
    config: &CampaignConfig,
    tables: &CampaignTables,
    map: &MapDefinition,
) -> MapRender {
    let resolved = resolve_map(config, tables, map);
    let directory = tables.player_directory();
    let pois = tables.pois_for(config, &map.id);
    let RenderGrid { rows } = build_render_grid(config, &resolved, &pois, &directory);

    MapRender {
        map: map.id.clone(),
        title: map.title.clone(),
        column_headers: config.grid.column_headers(),
        row_headers: config.grid.row_headers(),
        text_color: config.poi_text_color.clone(),
        cells: rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| CellView::new(cell, config))
                    .collect()
            })
            .collect(),
        legend: build_legend(&directory, &map.id, config),
        recent_changes: resolved.recent_changes,
    }
}

/// Render every configured map. Maps share nothing, so order doesn't matter.
pub fn render_all(config: &CampaignConfig, tables: &CampaignTables) -> Vec<MapRender> {
    config
        .maps
        .iter()
        .map(|map| render_map(config, tables, map))
        .collect()
}
