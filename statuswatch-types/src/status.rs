//! The canonical per-server status record.

use std::fmt;

use crate::{ServerConfig, MAX_SCORE, UNKNOWN_MAP};

/// Classification of a server's most recent poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Outcome {
    /// The endpoint answered with usable gameplay data.
    Success,
    /// The poll failed or the payload was unusable; see `error_detail`.
    Error,
    /// The server is configured but has not been polled yet.
    Loading,
}

impl Outcome {
    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "online",
            Outcome::Error => "error",
            Outcome::Loading => "loading",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Elapsed game time.
///
/// Displayed as `MM:SS`, or `HH:MM:SS` once an hour has passed. Unknown time
/// is displayed as `--:--`.
///
/// Only the second count is kept, so upstream clock text does not round-trip:
/// `"90:00"` displays as `01:30:00` and `"1:02:03"` as `01:02:03`. Clock text
/// that is not a valid time (`"12:75"`) is not stored at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameTime {
    #[default]
    Unknown,
    Elapsed(u64),
}

impl GameTime {
    /// Elapsed seconds, if known.
    pub fn seconds(&self) -> Option<u64> {
        match self {
            GameTime::Unknown => None,
            GameTime::Elapsed(secs) => Some(*secs),
        }
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameTime::Unknown => f.write_str("--:--"),
            GameTime::Elapsed(total) => {
                let hours = total / 3600;
                let minutes = (total % 3600) / 60;
                let seconds = total % 60;
                if hours > 0 {
                    write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
                } else {
                    write!(f, "{:02}:{:02}", minutes, seconds)
                }
            }
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for GameTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GameTime::Unknown => serializer.serialize_str("unknown"),
            GameTime::Elapsed(secs) => serializer.serialize_u64(*secs),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for GameTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Seconds(u64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Seconds(secs) => GameTime::Elapsed(secs),
            Repr::Text(_) => GameTime::Unknown,
        })
    }
}

/// Normalized snapshot of one server.
///
/// A record either carries gameplay data (`outcome == Success`) or an error
/// (`outcome == Error`, `error_detail` set, gameplay fields at their defaults),
/// never both. `Loading` records carry neither.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CanonicalStatus {
    pub id: String,
    pub name: String,
    pub outcome: Outcome,
    pub allies_count: u32,
    pub axis_count: u32,
    #[cfg_attr(feature = "serde", serde(rename = "gameTimeSeconds"))]
    pub game_time: GameTime,
    pub allies_score: u8,
    pub axis_score: u8,
    pub current_map: String,
    pub next_map: String,

    /// Unix timestamp in milliseconds of the observation.
    pub timestamp_ms: u64,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub error_detail: Option<String>,

    /// Consecutive failed polls, zero after any success.
    #[cfg_attr(feature = "serde", serde(default))]
    pub consecutive_failures: u32,
}

impl CanonicalStatus {
    /// Start building a successful record for `server`.
    pub fn builder(server: &ServerConfig) -> StatusBuilder {
        StatusBuilder::new(server)
    }

    /// A failed observation carrying `detail` and no gameplay data.
    pub fn error(server: &ServerConfig, detail: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            outcome: Outcome::Error,
            error_detail: Some(detail.into()),
            ..Self::blank(server, timestamp_ms)
        }
    }

    /// Placeholder for a configured server that has not been polled yet.
    ///
    /// The timestamp is zero because nothing has been observed.
    pub fn loading(server: &ServerConfig) -> Self {
        Self {
            outcome: Outcome::Loading,
            ..Self::blank(server, 0)
        }
    }

    fn blank(server: &ServerConfig, timestamp_ms: u64) -> Self {
        Self {
            id: server.id.clone(),
            name: server.name.clone(),
            outcome: Outcome::Success,
            allies_count: 0,
            axis_count: 0,
            game_time: GameTime::Unknown,
            allies_score: 0,
            axis_score: 0,
            current_map: UNKNOWN_MAP.to_string(),
            next_map: UNKNOWN_MAP.to_string(),
            timestamp_ms,
            error_detail: None,
            consecutive_failures: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn is_error(&self) -> bool {
        self.outcome == Outcome::Error
    }

    /// Players on both teams.
    pub fn total_players(&self) -> u32 {
        self.allies_count.saturating_add(self.axis_count)
    }
}

/// Builder for successful `CanonicalStatus` records.
///
/// Scores outside `0..=MAX_SCORE` are reset to zero.
#[derive(Debug, Clone)]
pub struct StatusBuilder {
    status: CanonicalStatus,
}

impl StatusBuilder {
    fn new(server: &ServerConfig) -> Self {
        Self {
            status: CanonicalStatus::blank(server, 0),
        }
    }

    pub fn allies_count(mut self, count: u32) -> Self {
        self.status.allies_count = count;
        self
    }

    pub fn axis_count(mut self, count: u32) -> Self {
        self.status.axis_count = count;
        self
    }

    pub fn game_time(mut self, time: GameTime) -> Self {
        self.status.game_time = time;
        self
    }

    pub fn allies_score(mut self, score: u8) -> Self {
        self.status.allies_score = bounded_score(score);
        self
    }

    pub fn axis_score(mut self, score: u8) -> Self {
        self.status.axis_score = bounded_score(score);
        self
    }

    pub fn current_map(mut self, map: impl Into<String>) -> Self {
        self.status.current_map = map.into();
        self
    }

    pub fn next_map(mut self, map: impl Into<String>) -> Self {
        self.status.next_map = map.into();
        self
    }

    /// Finish the record, stamping it with the observation time.
    pub fn build(mut self, timestamp_ms: u64) -> CanonicalStatus {
        self.status.timestamp_ms = timestamp_ms;
        self.status
    }
}

fn bounded_score(score: u8) -> u8 {
    if score > MAX_SCORE {
        0
    } else {
        score
    }
}
