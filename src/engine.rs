//! The status engine.
//!
//! [`StatusEngine`] is the single owned instance that ties the pieces
//! together: the server list, the orchestrator, the cache and the round
//! notifier. Share it behind an `Arc`; the [`Scheduler`](crate::Scheduler)
//! drives it, and consumers query it or subscribe to it.
//!
//! Rounds are serialized: a call to [`StatusEngine::run_round`] made while
//! another round is in flight waits for that round to finish first. Each
//! round's results are merged into the cache under one write lock, so readers
//! never observe a half-applied round.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use statuswatch::{MemorySource, StatusEngine};
//! use statuswatch_types::{Outcome, ServerConfig};
//!
//! let source = Arc::new(MemorySource::new());
//! source.set_payload("eu-1", json!({"allies": 12, "axis": 9, "map": "Foy"}));
//!
//! let engine = StatusEngine::builder(source)
//!     .servers(vec![ServerConfig::new("eu-1", "EU #1", "http://eu1.example/api")])
//!     .build();
//!
//! let update = tokio_test::block_on(engine.run_round());
//! assert_eq!(update.round, 1);
//! assert_eq!(engine.status("eu-1").unwrap().outcome, Outcome::Success);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use statuswatch_types::{CanonicalStatus, RoundUpdate, ServerConfig};

use crate::cache::StatusCache;
use crate::fetch::{now_ms, Fetcher, DEFAULT_FETCH_TIMEOUT};
use crate::poll::Orchestrator;
use crate::source::StatusSource;
use crate::subscribe::{Notifier, Subscription, DEFAULT_CAPACITY};

/// Summary of the engine's polling activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingStatus {
    /// A round is in flight right now.
    pub running: bool,
    pub last_round_at_ms: Option<u64>,
    pub rounds_completed: u64,
    pub cached_servers: usize,
    /// Sum of the consecutive-failure counters of all servers.
    pub total_retries: u64,
}

/// Polls a set of servers and keeps their latest canonical status.
#[derive(Debug)]
pub struct StatusEngine {
    orchestrator: Orchestrator,
    servers: RwLock<Arc<Vec<ServerConfig>>>,
    cache: RwLock<StatusCache>,
    notifier: Notifier,
    round_gate: Mutex<()>,
    running: AtomicBool,
}

impl StatusEngine {
    /// Create a new builder polling through `source`.
    pub fn builder(source: Arc<dyn StatusSource>) -> StatusEngineBuilder {
        StatusEngineBuilder {
            source,
            timeout: None,
            servers: Vec::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Replace the server list. Takes effect from the next round.
    pub fn set_servers(&self, servers: Vec<ServerConfig>) {
        info!(servers = servers.len(), "server list updated");
        *self.servers.write() = Arc::new(servers);
    }

    /// The currently configured servers.
    pub fn servers(&self) -> Arc<Vec<ServerConfig>> {
        self.servers.read().clone()
    }

    /// Describes the underlying status source.
    pub fn source_description(&self) -> &str {
        self.orchestrator.fetcher().source().description()
    }

    /// Subscribe to rounds completed from now on.
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    /// Run one complete round, merge it into the cache and notify subscribers.
    pub async fn run_round(&self) -> Arc<RoundUpdate> {
        let _gate = self.round_gate.lock().await;
        let _running = RunningGuard::set(&self.running);

        let servers = self.servers();
        let started = Instant::now();
        let statuses = self.orchestrator.run_round(&servers).await;
        let completed_at_ms = now_ms();

        let update = {
            let mut cache = self.cache.write();
            let changes = cache.apply(statuses, completed_at_ms);
            RoundUpdate {
                round: cache.rounds(),
                completed_at_ms,
                statuses: cache.entries().clone(),
                changes,
            }
        };

        info!(
            round = update.round,
            servers = servers.len(),
            failed = update.failed_servers(),
            changed = update.changed_servers(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "round complete"
        );

        let update = Arc::new(update);
        self.notifier.publish(update.clone());
        update
    }

    /// Latest cached record for `id`.
    pub fn status(&self, id: &str) -> Option<CanonicalStatus> {
        self.cache.read().get(id).cloned()
    }

    /// All cached records, keyed by server id.
    pub fn statuses(&self) -> BTreeMap<String, CanonicalStatus> {
        self.cache.read().entries().clone()
    }

    /// One record per configured server, in configuration order.
    ///
    /// Servers that have not completed a poll yet are reported as `Loading`.
    pub fn board(&self) -> Vec<CanonicalStatus> {
        let servers = self.servers();
        let cache = self.cache.read();
        servers
            .iter()
            .map(|server| {
                cache
                    .get(&server.id)
                    .cloned()
                    .unwrap_or_else(|| CanonicalStatus::loading(server))
            })
            .collect()
    }

    /// Completion time of the last round, in Unix milliseconds.
    pub fn last_round_at(&self) -> Option<u64> {
        self.cache.read().last_round_ms()
    }

    pub fn is_round_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Consecutive failures recorded for `id`.
    pub fn retry_count(&self, id: &str) -> u32 {
        self.orchestrator.retries().get(id)
    }

    pub fn polling_status(&self) -> PollingStatus {
        let cache = self.cache.read();
        PollingStatus {
            running: self.is_round_running(),
            last_round_at_ms: cache.last_round_ms(),
            rounds_completed: cache.rounds(),
            cached_servers: cache.len(),
            total_retries: self.orchestrator.retries().total(),
        }
    }

    /// Drop all cached records and retry counters.
    pub fn clear(&self) {
        self.cache.write().clear();
        self.orchestrator.retries().clear();
        info!("status cache cleared");
    }
}

/// Builder for StatusEngine.
#[derive(Debug)]
pub struct StatusEngineBuilder {
    source: Arc<dyn StatusSource>,
    timeout: Option<Duration>,
    servers: Vec<ServerConfig>,
    capacity: usize,
}

impl StatusEngineBuilder {
    /// Set the per-fetch timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the initial server list.
    pub fn servers(mut self, servers: Vec<ServerConfig>) -> Self {
        self.servers = servers;
        self
    }

    /// Rounds buffered per subscriber (default: 16).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Build the engine.
    pub fn build(self) -> StatusEngine {
        let fetcher =
            Fetcher::new(self.source).with_timeout(self.timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT));

        StatusEngine {
            orchestrator: Orchestrator::new(fetcher),
            servers: RwLock::new(Arc::new(self.servers)),
            cache: RwLock::new(StatusCache::new()),
            notifier: Notifier::new(self.capacity),
            round_gate: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }
}

/// Marks a round as in flight until dropped, including on cancellation.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self { flag }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
