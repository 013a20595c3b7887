//! Response normalization.
//!
//! [`normalize`] maps an arbitrary decoded JSON payload into a
//! [`CanonicalStatus`]. It is pure: no I/O, no clock, and it never fails. A
//! malformed field degrades to its default; a payload with no recognizable
//! domain field becomes an `Error` record with a `schema mismatch` detail.
//!
//! Field names are resolved through the alias table in [`aliases`], so
//! supporting a new API dialect means adding a row there.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use statuswatch::normalize::normalize;
//! use statuswatch_types::{Outcome, ServerConfig};
//!
//! let server = ServerConfig::new("eu-1", "EU #1", "http://eu1.example/api");
//! let raw = json!({"allies": 12, "axis": 9, "alliesScore": 7, "map": "Carentan"});
//!
//! let status = normalize(Some(&raw), &server, 1_703_160_000_000);
//! assert_eq!(status.outcome, Outcome::Success);
//! assert_eq!(status.allies_count, 12);
//! assert_eq!(status.allies_score, 0);
//! assert_eq!(status.current_map, "Carentan");
//! assert_eq!(status.next_map, "Unknown");
//! ```

pub mod aliases;
pub mod coerce;

use serde_json::Value;

use statuswatch_types::{CanonicalStatus, GameTime, ServerConfig};

use crate::source::FetchError;
use aliases::{lookup, paths, Slot, ALIAS_TABLE, PLACEHOLDER_KEYS};

/// Normalize `raw` into the canonical record for `server`.
///
/// `None` stands for an absent payload and is treated like an empty one.
pub fn normalize(raw: Option<&Value>, server: &ServerConfig, timestamp_ms: u64) -> CanonicalStatus {
    match extract(raw) {
        Ok(fields) => fields.into_status(server, timestamp_ms),
        Err(reason) => CanonicalStatus::error(
            server,
            FetchError::SchemaMismatch(reason.to_string()).detail(),
            timestamp_ms,
        ),
    }
}

/// Fields resolved from one payload.
#[derive(Debug, Default, PartialEq, Eq)]
struct Resolved {
    allies_count: Option<u32>,
    axis_count: Option<u32>,
    game_time: Option<u64>,
    allies_score: Option<u8>,
    axis_score: Option<u8>,
    current_map: Option<String>,
    next_map: Option<String>,
}

impl Resolved {
    fn is_empty(&self) -> bool {
        *self == Resolved::default()
    }

    fn into_status(self, server: &ServerConfig, timestamp_ms: u64) -> CanonicalStatus {
        let mut builder = CanonicalStatus::builder(server)
            .allies_count(self.allies_count.unwrap_or(0))
            .axis_count(self.axis_count.unwrap_or(0))
            .allies_score(self.allies_score.unwrap_or(0))
            .axis_score(self.axis_score.unwrap_or(0));

        if let Some(secs) = self.game_time {
            builder = builder.game_time(GameTime::Elapsed(secs));
        }
        if let Some(map) = self.current_map {
            builder = builder.current_map(map);
        }
        if let Some(map) = self.next_map {
            builder = builder.next_map(map);
        }

        builder.build(timestamp_ms)
    }
}

fn extract(raw: Option<&Value>) -> Result<Resolved, &'static str> {
    let raw = raw.ok_or("empty payload")?;
    let object = raw.as_object().ok_or("payload is not an object")?;
    if object.is_empty() {
        return Err("empty payload");
    }

    let resolved = Resolved {
        allies_count: resolve(raw, Slot::AlliesCount, coerce::count),
        axis_count: resolve(raw, Slot::AxisCount, coerce::count),
        game_time: resolve(raw, Slot::GameTime, coerce::game_time),
        allies_score: resolve(raw, Slot::AlliesScore, coerce::score),
        axis_score: resolve(raw, Slot::AxisScore, coerce::score),
        current_map: resolve(raw, Slot::CurrentMap, coerce::map_name),
        next_map: resolve(raw, Slot::NextMap, coerce::map_name),
    };

    if !resolved.is_empty() {
        Ok(resolved)
    } else if has_domain_key(raw) {
        Err("no usable field values")
    } else if PLACEHOLDER_KEYS.iter().any(|key| object.contains_key(*key)) {
        Err("placeholder payload")
    } else {
        Err("no recognizable fields")
    }
}

/// Whether any alias path is present, whatever its value.
fn has_domain_key(raw: &Value) -> bool {
    ALIAS_TABLE
        .iter()
        .flat_map(|row| row.paths.iter())
        .any(|path| lookup(raw, *path).is_some())
}

/// First value along the slot's alias paths that `coerce` accepts.
fn resolve<T>(raw: &Value, slot: Slot, coerce: impl Fn(&Value) -> Option<T>) -> Option<T> {
    paths(slot)
        .iter()
        .filter_map(|path| lookup(raw, *path))
        .find_map(coerce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statuswatch_types::{Outcome, MAX_SCORE, UNKNOWN_MAP};

    fn server() -> ServerConfig {
        ServerConfig::new("test", "Test", "http://test.example/api")
    }

    fn run(raw: Value) -> CanonicalStatus {
        normalize(Some(&raw), &server(), 1_000)
    }

    #[test]
    fn test_basic_dialect() {
        let status = run(json!({"allies": 12, "axis": 9, "alliesScore": 7, "map": "Carentan"}));

        assert_eq!(status.outcome, Outcome::Success);
        assert_eq!(status.allies_count, 12);
        assert_eq!(status.axis_count, 9);
        assert_eq!(status.allies_score, 0);
        assert_eq!(status.current_map, "Carentan");
        assert_eq!(status.next_map, UNKNOWN_MAP);
        assert_eq!(status.game_time, GameTime::Unknown);
        assert!(status.error_detail.is_none());
        assert_eq!(status.timestamp_ms, 1_000);
    }

    #[test]
    fn test_empty_object_is_schema_mismatch() {
        let status = run(json!({}));
        assert_eq!(status.outcome, Outcome::Error);
        assert!(status
            .error_detail
            .as_deref()
            .is_some_and(|d| d.starts_with("schema mismatch")));
        assert_eq!(status.current_map, UNKNOWN_MAP);
        assert_eq!(status.name, "Test");
    }

    #[test]
    fn test_absent_payload() {
        let status = normalize(None, &server(), 5);
        assert_eq!(status.outcome, Outcome::Error);
        assert_eq!(
            status.error_detail.as_deref(),
            Some("schema mismatch: empty payload")
        );
    }

    #[test]
    fn test_placeholder_api_is_rejected() {
        let status = run(json!({"userId": 1, "id": 1, "title": "delectus aut autem", "completed": false}));
        assert_eq!(status.outcome, Outcome::Error);
        assert_eq!(
            status.error_detail.as_deref(),
            Some("schema mismatch: placeholder payload")
        );
        assert_eq!(status.total_players(), 0);
    }

    #[test]
    fn placeholder_keys_alongside_domain_fields_are_fine() {
        let status = run(json!({"id": "srv-1", "allies": 3}));
        assert_eq!(status.outcome, Outcome::Success);
        assert_eq!(status.allies_count, 3);
    }

    #[test]
    fn test_non_object_payloads() {
        for raw in [json!([1, 2, 3]), json!("ok"), json!(42), Value::Null] {
            let status = run(raw);
            assert_eq!(status.outcome, Outcome::Error);
            assert!(status.error_detail.is_some());
        }
    }

    #[test]
    fn unrecognized_fields_only() {
        let status = run(json!({"foo": 1, "bar": "baz"}));
        assert_eq!(
            status.error_detail.as_deref(),
            Some("schema mismatch: no recognizable fields")
        );
    }

    #[test]
    fn test_alternate_dialects() {
        let team = run(json!({
            "team1": 20, "team2": 18,
            "team1Score": 3, "team2Score": 2,
            "level": "Hill 400", "nextLevel": "Kursk",
            "elapsed": 3723
        }));
        assert_eq!(team.allies_count, 20);
        assert_eq!(team.axis_count, 18);
        assert_eq!(team.allies_score, 3);
        assert_eq!(team.axis_score, 2);
        assert_eq!(team.current_map, "Hill 400");
        assert_eq!(team.next_map, "Kursk");
        assert_eq!(team.game_time.to_string(), "01:02:03");

        let nested = run(json!({
            "players": {"allies": ["a", "b"], "axis": 4},
            "score": {"allies": 1, "axis": 5},
            "map": {"name": "Foy"},
            "upcoming": "Remagen",
            "time": "12:34"
        }));
        assert_eq!(nested.allies_count, 2);
        assert_eq!(nested.axis_count, 4);
        assert_eq!(nested.allies_score, 1);
        assert_eq!(nested.axis_score, 5);
        assert_eq!(nested.current_map, "Foy");
        assert_eq!(nested.next_map, "Remagen");
        assert_eq!(nested.game_time, GameTime::Elapsed(754));
    }

    #[test]
    fn first_type_checking_alias_wins() {
        let status = run(json!({"allies": null, "alliedPlayers": "n/a", "team1": 7}));
        assert_eq!(status.allies_count, 7);

        // zero is a real value, not a miss
        let status = run(json!({"allies": 0, "team1": 7}));
        assert_eq!(status.allies_count, 0);
    }

    #[test]
    fn known_keys_with_unusable_values() {
        let status = run(json!({"allies": "n/a", "currentMap": 42}));
        assert_eq!(status.outcome, Outcome::Error);
        assert_eq!(
            status.error_detail.as_deref(),
            Some("schema mismatch: no usable field values")
        );
    }

    #[test]
    fn test_clock_text_is_stored_as_seconds() {
        let status = run(json!({"gameTime": "90:00", "allies": 1}));
        assert_eq!(status.game_time, GameTime::Elapsed(5400));
        assert_eq!(status.game_time.to_string(), "01:30:00");

        let status = run(json!({"gameTime": "12:75", "allies": 1}));
        assert_eq!(status.game_time, GameTime::Unknown);
    }

    #[test]
    fn test_coercions() {
        let status = run(json!({
            "allies": 12.9,
            "axis": -3,
            "axisScore": "4",
            "gameTime": "  07:05 ",
            "currentMap": "   ",
            "map": "Utah Beach"
        }));
        assert_eq!(status.allies_count, 12);
        assert_eq!(status.axis_count, 0);
        assert_eq!(status.axis_score, 4);
        assert_eq!(status.game_time.to_string(), "07:05");
        assert_eq!(status.current_map, "Utah Beach");
    }

    #[test]
    fn test_idempotent() {
        let raw = json!({"allies": 31, "axis": 29, "gameTime": 901, "nextMap": "Omaha Beach"});
        let a = normalize(Some(&raw), &server(), 77);
        let b = normalize(Some(&raw), &server(), 77);
        assert_eq!(a, b);
    }

    #[test]
    fn well_formed_payloads_stay_in_range() {
        let payloads = [
            json!({"allies": -100, "alliesScore": -1, "axisScore": 100}),
            json!({"allies": 1e30, "alliesScore": 5.99, "axisScore": "6"}),
            json!({"team1": "-7", "team1Score": 255, "team2Score": 256}),
        ];
        for raw in payloads {
            let status = run(raw);
            assert_eq!(status.outcome, Outcome::Success);
            assert!(status.allies_score <= MAX_SCORE);
            assert!(status.axis_score <= MAX_SCORE);
        }
    }
}
