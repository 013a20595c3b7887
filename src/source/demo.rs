//! Synthetic status source for running without real endpoints.
//!
//! Payloads are deterministic for a given server name and wall-clock minute,
//! so values drift once a minute the way a live match would. Successive
//! minutes rotate through the known API dialects, which exercises the whole
//! alias table.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{json, Value};

use statuswatch_types::ServerConfig;

use super::{FetchError, StatusSource};

const MAPS: &[&str] = &[
    "Omaha Beach",
    "Utah Beach",
    "Carentan",
    "Hill 400",
    "Hurtgen Forest",
    "Sainte-Marie-du-Mont",
    "Saint-Vith",
    "Kursk",
    "Stalingrad",
    "Remagen",
];

/// Generates plausible match data instead of contacting the endpoint.
#[derive(Debug, Clone, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The payload served for `server` at `now_ms`.
    pub fn payload_at(&self, server: &ServerConfig, now_ms: u64) -> Value {
        let minute = now_ms / 60_000;
        let seed = u64::from(name_hash(&server.name)).wrapping_add(minute);
        let mut rng = SplitMix64(seed);

        let allies = rng.range(15, 30);
        let axis = rng.range(12, 28);
        let game_secs = rng.range(5, 90) * 60 + rng.range(0, 59);
        let allies_score = rng.range(0, 5);
        let axis_score = rng.range(0, 5);
        let current_map = MAPS[rng.range(0, MAPS.len() as u64 - 1) as usize];
        let next_map = MAPS[rng.range(0, MAPS.len() as u64 - 1) as usize];

        match seed % 3 {
            0 => json!({
                "allies": allies,
                "axis": axis,
                "gameTime": clock_text(game_secs),
                "alliesScore": allies_score,
                "axisScore": axis_score,
                "currentMap": current_map,
                "nextMap": next_map,
            }),
            1 => json!({
                "team1": allies,
                "team2": axis,
                "elapsed": game_secs,
                "team1Score": allies_score,
                "team2Score": axis_score,
                "level": current_map,
                "nextLevel": next_map,
            }),
            _ => json!({
                "players": { "allies": allies, "axis": axis },
                "score": { "allies": allies_score, "axis": axis_score },
                "time": clock_text(game_secs),
                "map": { "name": current_map },
                "upcoming": next_map,
            }),
        }
    }
}

#[async_trait]
impl StatusSource for DemoSource {
    async fn fetch(&self, server: &ServerConfig) -> Result<Value, FetchError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Ok(self.payload_at(server, now_ms))
    }

    fn description(&self) -> &str {
        "demo"
    }
}

/// 31-multiplier string hash, folded to a non-negative 32-bit value.
fn name_hash(name: &str) -> u32 {
    let hash = name
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(c)));
    hash.unsigned_abs()
}

fn clock_text(total: u64) -> String {
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform-ish value in `min..=max`.
    fn range(&mut self, min: u64, max: u64) -> u64 {
        min + self.next() % (max - min + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use statuswatch_types::{Outcome, MAX_SCORE};

    fn server(name: &str) -> ServerConfig {
        ServerConfig::new(name.to_lowercase(), name, "http://demo.invalid")
    }

    #[test]
    fn test_deterministic_within_a_minute() {
        let source = DemoSource::new();
        let s = server("EU #1");
        let base = 1_703_160_000_000;
        assert_eq!(source.payload_at(&s, base), source.payload_at(&s, base + 59_999));
    }

    #[test]
    fn test_every_dialect_normalizes() {
        let source = DemoSource::new();
        let s = server("NA #2");
        for minute in 0..6u64 {
            let raw = source.payload_at(&s, minute * 60_000);
            let status = normalize(Some(&raw), &s, 0);
            assert_eq!(status.outcome, Outcome::Success, "payload {}", raw);
            assert!((15..=30).contains(&status.allies_count));
            assert!((12..=28).contains(&status.axis_count));
            assert!(status.allies_score <= MAX_SCORE);
            assert!(MAPS.contains(&status.current_map.as_str()));
            assert!(status.game_time.seconds().is_some());
        }
    }

    #[test]
    fn test_name_hash() {
        assert_eq!(name_hash(""), 0);
        assert_eq!(name_hash("a"), 97);
        assert_eq!(name_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_clock_text() {
        assert_eq!(clock_text(754), "12:34");
        assert_eq!(clock_text(3723), "01:02:03");
    }

    #[tokio::test]
    async fn test_fetch_succeeds() {
        let raw = DemoSource::new().fetch(&server("OCE")).await.unwrap();
        assert!(raw.is_object());
    }
}
