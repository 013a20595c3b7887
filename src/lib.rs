//! # statuswatch
//!
//! Polls a set of independently operated game-server status endpoints and
//! keeps one canonical, change-diffed status record per server. Endpoints
//! speak several historical JSON dialects; every response is normalized into
//! the schema from [`statuswatch_types`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  tick / refresh   ┌──────────────────────────────────────────┐
//! │  Scheduler  │──────────────────▶│               StatusEngine               │
//! └─────────────┘                   │  ┌──────────────┐     ┌───────────────┐  │
//!                                   │  │ Orchestrator │────▶│ StatusCache   │  │
//!                                   │  └──────┬───────┘     │ (diff, evict) │  │
//!                                   │         │ N parallel  └───────┬───────┘  │
//!                                   │         ▼                     │          │
//!                                   │  ┌──────────────┐             ▼          │
//!                                   │  │   Fetcher    │     ┌───────────────┐  │
//!                                   │  │  (timeout)   │     │   Notifier    │──┼──▶ Subscription
//!                                   │  └──────┬───────┘     └───────────────┘  │
//!                                   │         ▼                                │
//!                                   │  StatusSource ──▶ normalize()            │
//!                                   └──────────────────────────────────────────┘
//! ```
//!
//! - **[`normalize`]**: pure mapping from any payload to a [`CanonicalStatus`],
//!   driven by a key-alias table
//! - **[`source`]**: the [`StatusSource`] trait with HTTP, in-memory and demo
//!   implementations
//! - **[`Fetcher`]**: one bounded-time fetch per server, failures as records
//! - **[`Orchestrator`]**: concurrent rounds and consecutive-failure counting
//! - **[`StatusCache`]**: latest record per server and per-field change-sets
//! - **[`StatusEngine`]**: owns all of the above, serializes rounds, publishes
//!   a [`RoundUpdate`] per round
//! - **[`Scheduler`]**: start/stop interval polling and manual refresh
//! - **[`settings`]**: layered settings and server-list files
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll the servers in servers.json every 30 seconds
//! statuswatch --servers servers.json --interval 30
//!
//! # One round, printed as a table
//! statuswatch --servers servers.json --once
//!
//! # Synthetic data, no network
//! statuswatch --servers servers.json --demo
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use statuswatch::{MemorySource, StatusEngine};
//! use statuswatch_types::{ServerConfig, StatusField};
//!
//! # tokio_test::block_on(async {
//! let source = Arc::new(MemorySource::new());
//! source.set_payload("eu-1", json!({"team1": 20, "team2": 18, "level": "Kursk"}));
//!
//! let engine = StatusEngine::builder(source.clone())
//!     .servers(vec![ServerConfig::new("eu-1", "EU #1", "http://eu1.example/api")])
//!     .build();
//! let mut rounds = engine.subscribe();
//!
//! engine.run_round().await;
//! source.set_payload("eu-1", json!({"team1": 21, "team2": 18, "level": "Kursk"}));
//! engine.run_round().await;
//!
//! let first = rounds.recv().await.unwrap();
//! let second = rounds.recv().await.unwrap();
//! assert_eq!(first.changes["eu-1"].len(), StatusField::ALL.len());
//! assert_eq!(second.changes_for("eu-1").into_iter().collect::<Vec<_>>(), [StatusField::AlliesCount]);
//! # });
//! ```

pub mod cache;
pub mod engine;
pub mod fetch;
pub mod normalize;
pub mod poll;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod source;
pub mod subscribe;

pub use cache::StatusCache;
pub use engine::{PollingStatus, StatusEngine, StatusEngineBuilder};
pub use fetch::Fetcher;
pub use normalize::normalize;
pub use poll::{Orchestrator, RetryState};
pub use scheduler::{Scheduler, SchedulerState};
pub use settings::{ConfigError, Settings};
pub use source::{
    DemoSource, FetchError, HttpSource, HttpSourceBuilder, MemorySource, StatusSource,
};
pub use subscribe::{Notifier, Subscription};

pub use statuswatch_types::{CanonicalStatus, RoundUpdate, ServerConfig};
