use serde::{Deserialize, Serialize};

use crate::render::MapRender;

/// Envelope pushed to live subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapEvent {
    /// Every map, sent on connect and whenever a subscriber has fallen behind.
    Snapshot {
        #[serde(default)]
        seq: u64,
        maps: Vec<MapRender>,
        timestamp: String,
    },
    /// One map whose render changed.
    Update {
        #[serde(default)]
        seq: u64,
        map: MapRender,
        timestamp: String,
    },
}

impl MapEvent {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Snapshot { seq, .. } | Self::Update { seq, .. } => *seq,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::Update { .. } => "update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MapEvent;
    use crate::config::CampaignConfig;
    use crate::render::render_all;
    use crate::tables::CampaignTables;

    #[test]
    fn events_are_tagged_by_type() {
        let maps = render_all(&CampaignConfig::default(), &CampaignTables::default());
        let update = MapEvent::Update {
            seq: 7,
            map: maps[0].clone(),
            timestamp: "2025-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&update).expect("event serializes");
        assert_eq!(json["type"], "Update");
        assert_eq!(json["seq"], 7);
        assert_eq!(json["map"]["map"], "TGA");
        assert_eq!(update.kind(), "update");

        let snapshot = MapEvent::Snapshot {
            seq: 8,
            maps,
            timestamp: String::new(),
        };
        assert_eq!(snapshot.seq(), 8);
        assert_eq!(snapshot.kind(), "snapshot");
    }
}
