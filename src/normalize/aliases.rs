//! Key-alias table for the known status API dialects.
//!
//! Each canonical field maps to an ordered list of key paths. The normalizer
//! probes them in order and keeps the first value that type-checks, so a new
//! dialect is supported by appending a path to the relevant row.

use serde_json::Value;

/// A path of object keys, outermost first.
pub type KeyPath = &'static [&'static str];

/// Canonical fields populated from upstream payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    AlliesCount,
    AxisCount,
    GameTime,
    AlliesScore,
    AxisScore,
    CurrentMap,
    NextMap,
}

/// One row of the alias table.
#[derive(Debug)]
pub struct AliasRow {
    pub slot: Slot,
    pub paths: &'static [KeyPath],
}

pub static ALIAS_TABLE: &[AliasRow] = &[
    AliasRow {
        slot: Slot::AlliesCount,
        paths: &[
            &["allies"],
            &["alliedPlayers"],
            &["alliesPlayers"],
            &["alliesCount"],
            &["team1"],
            &["players", "allies"],
        ],
    },
    AliasRow {
        slot: Slot::AxisCount,
        paths: &[
            &["axis"],
            &["axisPlayers"],
            &["axisCount"],
            &["team2"],
            &["players", "axis"],
        ],
    },
    AliasRow {
        slot: Slot::GameTime,
        paths: &[
            &["gameTime"],
            &["time"],
            &["elapsed"],
            &["gameTimeSeconds"],
        ],
    },
    AliasRow {
        slot: Slot::AlliesScore,
        paths: &[
            &["alliesScore"],
            &["alliedScore"],
            &["team1Score"],
            &["score", "allies"],
            &["score", "team1"],
        ],
    },
    AliasRow {
        slot: Slot::AxisScore,
        paths: &[
            &["axisScore"],
            &["team2Score"],
            &["score", "axis"],
            &["score", "team2"],
        ],
    },
    AliasRow {
        slot: Slot::CurrentMap,
        paths: &[&["currentMap"], &["map"], &["level"], &["map", "name"]],
    },
    AliasRow {
        slot: Slot::NextMap,
        paths: &[&["nextMap"], &["nextLevel"], &["upcoming"]],
    },
];

/// Top-level keys of unrelated placeholder APIs (JSON test fixtures and the
/// like). A payload carrying these but no domain field is not a status report.
pub static PLACEHOLDER_KEYS: &[&str] = &["id", "userId", "title"];

/// Candidate paths for `slot`, in probe order.
pub fn paths(slot: Slot) -> &'static [KeyPath] {
    ALIAS_TABLE
        .iter()
        .find(|row| row.slot == slot)
        .map(|row| row.paths)
        .unwrap_or(&[])
}

/// Follow `path` through nested objects.
pub fn lookup<'a>(raw: &'a Value, path: KeyPath) -> Option<&'a Value> {
    path.iter().try_fold(raw, |node, key| node.as_object()?.get(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_slot_has_a_row() {
        for slot in [
            Slot::AlliesCount,
            Slot::AxisCount,
            Slot::GameTime,
            Slot::AlliesScore,
            Slot::AxisScore,
            Slot::CurrentMap,
            Slot::NextMap,
        ] {
            assert!(!paths(slot).is_empty(), "{:?} has no aliases", slot);
        }
    }

    #[test]
    fn test_lookup_nested() {
        let raw = json!({"players": {"allies": 14}, "map": {"name": "Foy"}});
        assert_eq!(lookup(&raw, &["players", "allies"]), Some(&json!(14)));
        assert_eq!(lookup(&raw, &["map", "name"]), Some(&json!("Foy")));
        assert_eq!(lookup(&raw, &["players", "axis"]), None);
    }

    #[test]
    fn lookup_stops_at_non_objects() {
        let raw = json!({"map": "Foy"});
        assert_eq!(lookup(&raw, &["map", "name"]), None);
        assert_eq!(lookup(&json!([1, 2]), &["map"]), None);
    }
}
