//! In-memory status source with scripted results.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use statuswatch_types::ServerConfig;

use super::{FetchError, StatusSource};

/// Serves payloads and failures set up ahead of time, keyed by server id.
///
/// Each server can also be given an artificial latency, which makes slow and
/// timing-out endpoints easy to reproduce under a paused tokio clock.
#[derive(Debug, Default)]
pub struct MemorySource {
    results: RwLock<HashMap<String, Result<Value, FetchError>>>,
    delays: RwLock<HashMap<String, Duration>>,
    calls: RwLock<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `id` with `payload`.
    pub fn set_payload(&self, id: impl Into<String>, payload: Value) {
        self.results.write().insert(id.into(), Ok(payload));
    }

    /// Respond to `id` with `error`.
    pub fn set_error(&self, id: impl Into<String>, error: FetchError) {
        self.results.write().insert(id.into(), Err(error));
    }

    /// Delay every response to `id` by `delay`.
    pub fn set_delay(&self, id: impl Into<String>, delay: Duration) {
        self.delays.write().insert(id.into(), delay);
    }

    /// Forget the scripted result for `id`; later fetches fail as unreachable.
    pub fn remove(&self, id: &str) {
        self.results.write().remove(id);
        self.delays.write().remove(id);
    }

    /// Number of fetches issued for `id`.
    pub fn calls(&self, id: &str) -> usize {
        self.calls.read().get(id).copied().unwrap_or(0)
    }

    /// Number of fetches issued for all servers.
    pub fn total_calls(&self) -> usize {
        self.calls.read().values().sum()
    }
}

#[async_trait]
impl StatusSource for MemorySource {
    async fn fetch(&self, server: &ServerConfig) -> Result<Value, FetchError> {
        *self.calls.write().entry(server.id.clone()).or_insert(0) += 1;

        let delay = self.delays.read().get(&server.id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.results.read().get(&server.id).cloned();
        result.unwrap_or_else(|| {
            Err(FetchError::Network(format!(
                "no payload scripted for {}",
                server.id
            )))
        })
    }

    fn description(&self) -> &str {
        "memory"
    }
}
