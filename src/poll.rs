//! Poll orchestration.
//!
//! A round fans one fetch per configured server out concurrently and waits for
//! every one of them. A slow or failing server never delays or cancels the
//! others beyond the fetch timeout, and the round itself cannot fail.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures_util::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, warn};

use statuswatch_types::{CanonicalStatus, ServerConfig};

use crate::fetch::Fetcher;

/// Consecutive-failure counters, keyed by server id.
///
/// Diagnostics only: a server is polled every round however often it fails.
#[derive(Debug, Default)]
pub struct RetryState {
    counts: Mutex<HashMap<String, u32>>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the counter for `id`.
    pub fn record_success(&self, id: &str) {
        self.counts.lock().remove(id);
    }

    /// Bump the counter for `id` and return the new value.
    pub fn record_failure(&self, id: &str) -> u32 {
        let mut counts = self.counts.lock();
        let count = counts.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Current consecutive failures for `id`.
    pub fn get(&self, id: &str) -> u32 {
        self.counts.lock().get(id).copied().unwrap_or(0)
    }

    /// Sum of all current counters.
    pub fn total(&self) -> u64 {
        self.counts.lock().values().map(|&n| u64::from(n)).sum()
    }

    /// Drop counters for servers that are no longer configured.
    pub fn retain(&self, servers: &[ServerConfig]) {
        let keep: HashSet<&str> = servers.iter().map(|s| s.id.as_str()).collect();
        self.counts.lock().retain(|id, _| keep.contains(id.as_str()));
    }

    pub fn clear(&self) {
        self.counts.lock().clear();
    }
}

/// Runs complete polling rounds over a server list.
#[derive(Debug)]
pub struct Orchestrator {
    fetcher: Fetcher,
    retries: RetryState,
}

impl Orchestrator {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            retries: RetryState::new(),
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn retries(&self) -> &RetryState {
        &self.retries
    }

    /// Poll every server concurrently and return one record per server id.
    ///
    /// Failed records carry the updated consecutive-failure count. An empty
    /// server list yields an empty map without touching the network.
    pub async fn run_round(&self, servers: &[ServerConfig]) -> BTreeMap<String, CanonicalStatus> {
        if servers.is_empty() {
            debug!("no servers configured, skipping fetches");
            self.retries.clear();
            return BTreeMap::new();
        }

        let outcomes = join_all(servers.iter().map(|server| self.fetcher.fetch(server))).await;

        let mut round = BTreeMap::new();
        for (server, mut status) in servers.iter().zip(outcomes) {
            if status.is_success() {
                self.retries.record_success(&server.id);
            } else {
                let failures = self.retries.record_failure(&server.id);
                status.consecutive_failures = failures;
                warn!(
                    server = %server.id,
                    detail = status.error_detail.as_deref().unwrap_or_default(),
                    consecutive_failures = failures,
                    "server poll failed"
                );
            }
            round.insert(server.id.clone(), status);
        }

        self.retries.retain(servers);
        round
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FetchError, MemorySource};
    use serde_json::json;
    use statuswatch_types::Outcome;
    use std::sync::Arc;
    use std::time::Duration;

    fn server(id: &str) -> ServerConfig {
        ServerConfig::new(id, id.to_uppercase(), format!("http://{}.example", id))
    }

    fn orchestrator(source: &Arc<MemorySource>) -> Orchestrator {
        let fetcher = Fetcher::new(source.clone()).with_timeout(Duration::from_secs(8));
        Orchestrator::new(fetcher)
    }

    #[test]
    fn test_retry_state() {
        let retries = RetryState::new();
        assert_eq!(retries.record_failure("a"), 1);
        assert_eq!(retries.record_failure("a"), 2);
        assert_eq!(retries.record_failure("b"), 1);
        assert_eq!(retries.total(), 3);

        retries.record_success("a");
        assert_eq!(retries.get("a"), 0);
        assert_eq!(retries.total(), 1);

        retries.retain(&[server("a")]);
        assert_eq!(retries.get("b"), 0);

        retries.record_failure("a");
        retries.clear();
        assert_eq!(retries.total(), 0);
    }

    #[tokio::test]
    async fn test_empty_round_makes_no_calls() {
        let source = Arc::new(MemorySource::new());
        let round = orchestrator(&source).run_round(&[]).await;
        assert!(round.is_empty());
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_mixed_round_keeps_results_apart() {
        let source = Arc::new(MemorySource::new());
        source.set_payload("ok", json!({"allies": 10, "axis": 11}));
        source.set_error("bad", FetchError::Protocol(502));

        let round = orchestrator(&source)
            .run_round(&[server("ok"), server("bad")])
            .await;

        assert_eq!(round.len(), 2);
        let ok = &round["ok"];
        assert_eq!(ok.outcome, Outcome::Success);
        assert!(ok.error_detail.is_none());
        assert_eq!(ok.consecutive_failures, 0);

        let bad = &round["bad"];
        assert_eq!(bad.outcome, Outcome::Error);
        assert_eq!(bad.error_detail.as_deref(), Some("http 502"));
        assert_eq!(bad.allies_count, 0);
        assert_eq!(bad.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_failures_accumulate_and_reset() {
        let source = Arc::new(MemorySource::new());
        source.set_error("a", FetchError::Network("refused".into()));
        let orchestrator = orchestrator(&source);
        let servers = [server("a")];

        orchestrator.run_round(&servers).await;
        let round = orchestrator.run_round(&servers).await;
        assert_eq!(round["a"].consecutive_failures, 2);
        assert_eq!(orchestrator.retries().get("a"), 2);

        source.set_payload("a", json!({"allies": 1}));
        let round = orchestrator.run_round(&servers).await;
        assert_eq!(round["a"].consecutive_failures, 0);
        assert_eq!(orchestrator.retries().get("a"), 0);
    }

    #[tokio::test]
    async fn test_every_server_failing_still_yields_records() {
        let source = Arc::new(MemorySource::new());
        let servers = [server("a"), server("b"), server("c")];
        let round = orchestrator(&source).run_round(&servers).await;

        assert_eq!(round.len(), 3);
        assert!(round.values().all(|s| s.error_detail.as_deref() == Some("unreachable")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_server_bounded_by_one_timeout() {
        let source = Arc::new(MemorySource::new());
        for id in ["a", "b", "c"] {
            source.set_payload(id, json!({"allies": 5}));
        }
        source.set_delay("a", Duration::from_secs(1));
        source.set_delay("b", Duration::from_secs(60));
        source.set_delay("c", Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        let round = orchestrator(&source)
            .run_round(&[server("a"), server("b"), server("c")])
            .await;
        let elapsed = start.elapsed();

        assert_eq!(round.len(), 3);
        assert_eq!(round["a"].outcome, Outcome::Success);
        assert_eq!(round["b"].error_detail.as_deref(), Some("timeout"));
        assert_eq!(round["c"].outcome, Outcome::Success);
        assert!(elapsed >= Duration::from_secs(8));
        assert!(elapsed < Duration::from_secs(9));
    }
}
