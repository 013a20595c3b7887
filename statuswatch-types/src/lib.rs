//! # statuswatch-types
//!
//! The canonical schema every statuswatch component reads and writes. Game-server
//! statistics APIs come in many historical dialects; this crate defines the one
//! shape they are all normalized into, plus the per-round notification handed to
//! subscribers.
//!
//! ## Design Goals
//!
//! - **No I/O**: plain data types, cheap to clone and compare
//! - **Optional serialization**: enable the `serde` feature for JSON export
//! - **Deterministic diffs**: every compared field is an integer or a string, so
//!   change detection never needs an epsilon
//!
//! ## Example
//!
//! ```rust
//! use statuswatch_types::{CanonicalStatus, GameTime, Outcome, ServerConfig, StatusField};
//!
//! let server = ServerConfig::new("eu-1", "EU #1", "http://eu1.example/api/status");
//!
//! let first = CanonicalStatus::builder(&server)
//!     .allies_count(32)
//!     .axis_count(30)
//!     .game_time(GameTime::Elapsed(754))
//!     .current_map("Carentan")
//!     .build(1_703_160_000_000);
//!
//! assert_eq!(first.outcome, Outcome::Success);
//! assert_eq!(first.game_time.to_string(), "12:34");
//!
//! // A first observation changes every field.
//! assert_eq!(first.diff(None).len(), StatusField::ALL.len());
//!
//! // An identical observation changes none, whatever its timestamp.
//! let mut second = first.clone();
//! second.timestamp_ms += 60_000;
//! assert!(second.diff(Some(&first)).is_empty());
//! ```

mod field;
mod round;
mod server;
mod status;

pub use field::*;
pub use round::*;
pub use server::*;
pub use status::*;

/// Default text for map names that could not be determined.
pub const UNKNOWN_MAP: &str = "Unknown";

/// Inclusive upper bound for team scores (best-of-5 round counters).
pub const MAX_SCORE: u8 = 5;
