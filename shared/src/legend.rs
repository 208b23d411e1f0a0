use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::colors::darken;
use crate::config::CampaignConfig;
use crate::tables::{MapAffiliation, PlayerDirectory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub name: String,
    pub color: String,
    pub swatch_border: String,
}

/// Case-insensitive ordering; on a tie lower-case sorts before upper-case.
///
/// Letters compare by code point after lower-casing, with no accent folding, so `"Émile"`
/// sorts after `"Zed"`. Rosters are expected to use plain ASCII names.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Players shown on `map`'s legend: those affiliated with it or with every map, sorted by name.
pub fn build_legend(
    directory: &PlayerDirectory,
    map: &str,
    config: &CampaignConfig,
) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = directory
        .iter()
        .filter(|(_, info)| info.maps.includes(map))
        .map(|(name, _)| {
            let color = directory
                .color_of(name)
                .unwrap_or(config.neutral_color.as_str())
                .to_string();
            LegendEntry {
                name: name.to_string(),
                swatch_border: darken(&color),
                color,
            }
        })
        .collect();
    entries.sort_by(|a, b| locale_cmp(&a.name, &b.name));
    entries
}

/// Players on exactly one map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRoster {
    pub map: String,
    pub players: Vec<String>,
}

/// Roster grouped by affiliation. Players tagged with a map the campaign doesn't define are
/// left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub single_map: Vec<MapRoster>,
    pub both_maps: Vec<String>,
}

impl RosterSummary {
    pub fn from_directory(directory: &PlayerDirectory, config: &CampaignConfig) -> Self {
        let mut single_map: Vec<MapRoster> = config
            .maps
            .iter()
            .map(|map| MapRoster {
                map: map.id.clone(),
                players: Vec::new(),
            })
            .collect();
        let mut both_maps = Vec::new();

        for (name, info) in directory.iter() {
            match &info.maps {
                MapAffiliation::Both => both_maps.push(name.to_string()),
                MapAffiliation::Map(id) => {
                    if let Some(group) = single_map.iter_mut().find(|group| &group.map == id) {
                        group.players.push(name.to_string());
                    }
                }
            }
        }

        for group in &mut single_map {
            group.players.sort_by(|a, b| locale_cmp(a, b));
        }
        both_maps.sort_by(|a, b| locale_cmp(a, b));

        Self {
            single_map,
            both_maps,
        }
    }

    pub fn total(&self) -> usize {
        self.both_maps.len()
            + self
                .single_map
                .iter()
                .map(|group| group.players.len())
                .sum::<usize>()
    }
}
