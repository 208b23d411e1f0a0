//! Row types for the campaign's input tables and the per-map lookups derived from them.
//!
//! Every row field defaults to empty so that a half-filled row still deserializes; the lookups
//! below are where malformed rows get dropped.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CampaignConfig;
use crate::coords::{GridDimensions, normalize_territory};

/// Territory label → owner player name.
pub type OwnershipMap = HashMap<String, String>;
/// Territory label → POI display name.
pub type PoiMap = HashMap<String, String>;

/// Which table a host-side mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Roster,
    Pois,
    StartingTerritories,
    Results,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Roster,
        TableKind::Pois,
        TableKind::StartingTerritories,
        TableKind::Results,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Roster => "roster.json",
            Self::Pois => "pois.json",
            Self::StartingTerritories => "starting_territories.json",
            Self::Results => "results.json",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Roster => "roster",
            Self::Pois => "pois",
            Self::StartingTerritories => "starting_territories",
            Self::Results => "results",
        };
        f.write_str(name)
    }
}

/// The map(s) a player appears on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MapAffiliation {
    Map(String),
    Both,
}

impl MapAffiliation {
    pub fn includes(&self, map: &str) -> bool {
        match self {
            Self::Both => true,
            Self::Map(id) => id == map,
        }
    }
}

impl Default for MapAffiliation {
    fn default() -> Self {
        Self::Map(String::new())
    }
}

impl From<String> for MapAffiliation {
    fn from(value: String) -> Self {
        if value == crate::config::BOTH_MAPS_TAG {
            Self::Both
        } else {
            Self::Map(value)
        }
    }
}

impl From<MapAffiliation> for String {
    fn from(value: MapAffiliation) -> Self {
        match value {
            MapAffiliation::Both => crate::config::BOTH_MAPS_TAG.to_string(),
            MapAffiliation::Map(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub maps: MapAffiliation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoiRow {
    #[serde(default)]
    pub territory: String,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartingTerritoryRow {
    #[serde(default)]
    pub territory: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub map: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "P1 Win")]
    Player1Win,
    #[serde(rename = "P2 Win")]
    Player2Win,
    #[serde(rename = "Draw")]
    Draw,
    /// Anything the results table holds that is not one of the three outcomes.
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl Outcome {
    pub const RECOGNIZED: [Outcome; 3] = [Outcome::Player1Win, Outcome::Player2Win, Outcome::Draw];

    pub fn label(self) -> &'static str {
        match self {
            Self::Player1Win => "P1 Win",
            Self::Player2Win => "P2 Win",
            Self::Draw => "Draw",
            Self::Unrecognized => "",
        }
    }
}

/// One row of the append-only results log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub player1: String,
    #[serde(default)]
    pub player2: String,
    #[serde(default, rename = "result")]
    pub outcome: Outcome,
    #[serde(default)]
    pub map: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_territory: Option<String>,
    /// Score and mission columns; carried through storage, never read by the engine.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MatchResult {
    /// Winner's name, if the outcome names one and the slot is filled.
    pub fn winner(&self) -> Option<&str> {
        let name = match self.outcome {
            Outcome::Player1Win => &self.player1,
            Outcome::Player2Win => &self.player2,
            Outcome::Draw | Outcome::Unrecognized => return None,
        };
        (!name.is_empty()).then_some(name.as_str())
    }

    /// Normalized claimed territory, or `None` when the field is missing or blank.
    pub fn claimed_label(&self) -> Option<String> {
        self.claimed_territory
            .as_deref()
            .map(normalize_territory)
            .filter(|label| !label.is_empty())
    }
}

/// Roster entry keyed by name, as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub color: String,
    pub maps: MapAffiliation,
}

/// Name → color/affiliation. A name listed twice keeps its last row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerDirectory {
    players: HashMap<String, PlayerInfo>,
}

impl PlayerDirectory {
    pub fn from_rows(rows: &[PlayerRow]) -> Self {
        let players = rows
            .iter()
            .filter(|row| !row.name.is_empty())
            .map(|row| {
                (
                    row.name.clone(),
                    PlayerInfo {
                        color: row.color.clone(),
                        maps: row.maps.clone(),
                    },
                )
            })
            .collect();
        Self { players }
    }

    /// Roster color, ignoring blank cells.
    pub fn color_of(&self, name: &str) -> Option<&str> {
        self.players
            .get(name)
            .map(|info| info.color.as_str())
            .filter(|color| !color.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlayerInfo)> {
        self.players.iter().map(|(name, info)| (name.as_str(), info))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Build a territory-keyed lookup for one map, dropping rows with an off-grid territory or a
/// blank value. Later rows overwrite earlier ones.
fn territory_lookup<'a, R: 'a>(
    rows: impl IntoIterator<Item = &'a R>,
    grid: &GridDimensions,
    map: &str,
    fields: impl Fn(&'a R) -> (&'a str, &'a str, &'a str),
) -> HashMap<String, String> {
    let mut lookup = HashMap::new();
    for row in rows {
        let (territory, row_map, value) = fields(row);
        if row_map != map || value.is_empty() {
            continue;
        }
        let label = normalize_territory(territory);
        if !grid.contains_label(&label) {
            continue;
        }
        lookup.insert(label, value.to_string());
    }
    lookup
}

/// Everything the engine reads, materialized from one bulk read of each table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignTables {
    #[serde(default)]
    pub roster: Vec<PlayerRow>,
    #[serde(default)]
    pub pois: Vec<PoiRow>,
    #[serde(default)]
    pub starting_territories: Vec<StartingTerritoryRow>,
    #[serde(default)]
    pub results: Vec<MatchResult>,
}

impl CampaignTables {
    pub fn player_directory(&self) -> PlayerDirectory {
        PlayerDirectory::from_rows(&self.roster)
    }

    pub fn starting_owners(&self, config: &CampaignConfig, map: &str) -> OwnershipMap {
        territory_lookup(&self.starting_territories, &config.grid, map, |row| {
            (
                row.territory.as_str(),
                row.map.as_str(),
                row.owner.as_str(),
            )
        })
    }

    pub fn pois_for(&self, config: &CampaignConfig, map: &str) -> PoiMap {
        territory_lookup(&self.pois, &config.grid, map, |row| {
            (row.territory.as_str(), row.map.as_str(), row.name.as_str())
        })
    }

    /// Non-empty roster names in table order, for result-entry choices.
    pub fn player_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.roster {
            if !row.name.is_empty() && !names.contains(&row.name) {
                names.push(row.name.clone());
            }
        }
        names
    }
}
