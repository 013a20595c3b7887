//! Per-server fetcher.
//!
//! Wraps a [`StatusSource`] with a hard time bound and the normalizer. A fetch
//! always yields a [`CanonicalStatus`]; transport failures, timeouts and
//! unusable payloads come back as `Error` records rather than as `Err`.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;
use tracing::debug;

use statuswatch_types::{CanonicalStatus, ServerConfig};

use crate::normalize::normalize;
use crate::source::{FetchError, StatusSource};

/// Default bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches and normalizes the status of one server at a time.
///
/// Never retries; see [`Orchestrator`](crate::Orchestrator) for retry
/// accounting.
#[derive(Debug, Clone)]
pub struct Fetcher {
    source: Arc<dyn StatusSource>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self {
            source,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the per-fetch time bound (default: 10 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn source(&self) -> &dyn StatusSource {
        self.source.as_ref()
    }

    /// Poll `server` once.
    pub async fn fetch(&self, server: &ServerConfig) -> CanonicalStatus {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.source.fetch(server)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };
        let timestamp_ms = now_ms();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(raw) => {
                let status = normalize(Some(&raw), server, timestamp_ms);
                debug!(server = %server.id, outcome = %status.outcome, elapsed_ms, "fetched status");
                status
            }
            Err(err) => {
                let detail = err.detail();
                debug!(server = %server.id, error = %err, elapsed_ms, "fetch failed");
                CanonicalStatus::error(server, detail, timestamp_ms)
            }
        }
    }
}

/// Current Unix time in milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
