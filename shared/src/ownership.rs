use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::tables::{MatchResult, Outcome, OwnershipMap};

/// Current ownership of one map after replaying the results log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOwnership {
    pub owners: OwnershipMap,
    /// Labels claimed by the last ownership-changing events, oldest first. A territory claimed
    /// twice inside the window appears twice.
    pub recent_changes: Vec<String>,
}

impl ResolvedOwnership {
    pub fn owner_of(&self, territory: &str) -> Option<&str> {
        self.owners.get(territory).map(String::as_str)
    }

    pub fn is_recent(&self, territory: &str) -> bool {
        self.recent_changes.iter().any(|label| label == territory)
    }
}

/// Replay `results` in log order over `starting` for `map`.
///
/// Results for other maps and draws are ignored. A non-draw result claims its territory for the
/// winner; results without a winner or without a territory change nothing. Only the last
/// `window` claims are kept in `recent_changes`.
pub fn resolve_ownership(
    starting: &OwnershipMap,
    results: &[MatchResult],
    map: &str,
    window: usize,
) -> ResolvedOwnership {
    let mut owners = starting.clone();
    let mut recent: VecDeque<String> = VecDeque::with_capacity(window);

    for result in results {
        if result.map != map || result.outcome == Outcome::Draw {
            continue;
        }
        let (Some(winner), Some(territory)) = (result.winner(), result.claimed_label()) else {
            continue;
        };

        owners.insert(territory.clone(), winner.to_string());

        if window == 0 {
            continue;
        }
        if recent.len() == window {
            recent.pop_front();
        }
        recent.push_back(territory);
    }

    ResolvedOwnership {
        owners,
        recent_changes: recent.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_ownership;
    use crate::tables::{MatchResult, Outcome, OwnershipMap};

    fn result(map: &str, p1: &str, p2: &str, outcome: Outcome, territory: &str) -> MatchResult {
        MatchResult {
            player1: p1.to_string(),
            player2: p2.to_string(),
            outcome,
            map: map.to_string(),
            claimed_territory: Some(territory.to_string()),
            ..MatchResult::default()
        }
    }

    fn owners(pairs: &[(&str, &str)]) -> OwnershipMap {
        pairs
            .iter()
            .map(|(t, o)| (t.to_string(), o.to_string()))
            .collect()
    }

    #[test]
    fn draws_never_change_ownership() {
        let starting = owners(&[("A1", "Alice"), ("C3", "Bob")]);
        let log = vec![
            result("TGA", "Alice", "Bob", Outcome::Draw, "C3"),
            result("TGA", "Bob", "Alice", Outcome::Draw, "A1"),
            result("TGA", "Bob", "Alice", Outcome::Draw, "N9"),
        ];
        let resolved = resolve_ownership(&starting, &log, "TGA", 3);
        assert_eq!(resolved.owners, starting);
        assert!(resolved.recent_changes.is_empty());
    }

    #[test]
    fn later_claim_wins_regardless_of_player_slot() {
        let log = vec![
            result("TGA", "Alice", "Bob", Outcome::Player1Win, "E5"),
            result("TGA", "Alice", "Bob", Outcome::Player2Win, "e5"),
        ];
        let resolved = resolve_ownership(&OwnershipMap::new(), &log, "TGA", 3);
        assert_eq!(resolved.owner_of("E5"), Some("Bob"));

        let log = vec![
            result("TGA", "Bob", "Alice", Outcome::Player1Win, "E5"),
            result("TGA", "Bob", "Alice", Outcome::Player2Win, "E5"),
        ];
        let resolved = resolve_ownership(&OwnershipMap::new(), &log, "TGA", 3);
        assert_eq!(resolved.owner_of("E5"), Some("Alice"));
    }

    #[test]
    fn recent_window_keeps_last_n_in_log_order_without_dedup() {
        let claims = ["A1", "B2", "C3", "B2", "D4"];
        let log: Vec<MatchResult> = claims
            .iter()
            .map(|t| result("TGA", "Alice", "Bob", Outcome::Player1Win, t))
            .collect();

        for k in 0..=claims.len() {
            let resolved = resolve_ownership(&OwnershipMap::new(), &log[..k], "TGA", 3);
            let expected: Vec<String> = claims[..k]
                .iter()
                .skip(k.saturating_sub(3))
                .map(|t| t.to_string())
                .collect();
            assert_eq!(resolved.recent_changes, expected, "k = {k}");
        }

        let resolved = resolve_ownership(&OwnershipMap::new(), &log, "TGA", 3);
        assert_eq!(resolved.recent_changes, vec!["C3", "B2", "D4"]);
        assert!(resolved.is_recent("B2"));
        assert!(!resolved.is_recent("A1"));
    }

    #[test]
    fn zero_window_tracks_no_recent_changes() {
        let log = vec![result("TGA", "Alice", "Bob", Outcome::Player1Win, "A1")];
        let resolved = resolve_ownership(&OwnershipMap::new(), &log, "TGA", 0);
        assert_eq!(resolved.owner_of("A1"), Some("Alice"));
        assert!(resolved.recent_changes.is_empty());
    }

    #[test]
    fn other_maps_and_malformed_rows_are_skipped() {
        let mut no_territory = result("TGA", "Alice", "Bob", Outcome::Player1Win, "");
        no_territory.claimed_territory = None;
        let log = vec![
            result("Westgate", "Alice", "Bob", Outcome::Player1Win, "A1"),
            result("TGA", "Alice", "Bob", Outcome::Unrecognized, "B1"),
            result("TGA", "", "Bob", Outcome::Player1Win, "C1"),
            result("TGA", "Alice", "Bob", Outcome::Player2Win, "  "),
            no_territory,
            result("TGA", "Alice", "Bob", Outcome::Player2Win, " d1 "),
        ];
        let resolved = resolve_ownership(&OwnershipMap::new(), &log, "TGA", 3);
        assert_eq!(resolved.owners, owners(&[("D1", "Bob")]));
        assert_eq!(resolved.recent_changes, vec!["D1"]);
    }

    #[test]
    fn zero_padded_claim_recolors_the_real_cell() {
        let starting = owners(&[("A1", "Alice")]);
        let log = vec![
            result("TGA", "Alice", "Bob", Outcome::Player2Win, "a01"),
            result("TGA", "Alice", "Bob", Outcome::Player1Win, "C3"),
        ];
        let resolved = resolve_ownership(&starting, &log, "TGA", 2);
        assert_eq!(resolved.owners, owners(&[("A1", "Bob"), ("C3", "Alice")]));
        assert_eq!(resolved.recent_changes, vec!["A1", "C3"]);
        assert!(resolved.is_recent("A1"));
    }

    #[test]
    fn starting_snapshot_is_not_mutated() {
        let starting = owners(&[("A1", "Alice")]);
        let log = vec![result("TGA", "Alice", "Bob", Outcome::Player2Win, "A1")];
        let first = resolve_ownership(&starting, &log, "TGA", 3);
        let second = resolve_ownership(&starting, &log, "TGA", 3);
        assert_eq!(starting.get("A1").map(String::as_str), Some("Alice"));
        assert_eq!(first, second);
        assert_eq!(first.owner_of("A1"), Some("Bob"));
    }
}
