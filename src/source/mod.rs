//! Status source abstraction.
//!
//! A [`StatusSource`] turns a [`ServerConfig`] into a decoded JSON payload. The
//! fetcher owns timeouts and normalization, so a source only has to perform
//! the transfer and classify transport failures.
//!
//! - [`HttpSource`] issues real HTTP GET requests
//! - [`MemorySource`] serves scripted payloads, for tests and embedding
//! - [`DemoSource`] synthesizes plausible payloads for demos

mod demo;
mod error;
mod http;
mod memory;

pub use demo::DemoSource;
pub use error::FetchError;
pub use http::{HttpSource, HttpSourceBuilder};
pub use memory::MemorySource;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use statuswatch_types::ServerConfig;

/// Trait for retrieving raw status payloads.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use statuswatch::{MemorySource, StatusSource};
/// use statuswatch_types::ServerConfig;
///
/// let server = ServerConfig::new("eu-1", "EU #1", "http://eu1.example/api");
/// let source = MemorySource::new();
/// source.set_payload("eu-1", json!({"allies": 10}));
///
/// let raw = tokio_test::block_on(source.fetch(&server)).unwrap();
/// assert_eq!(raw["allies"], 10);
/// ```
#[async_trait]
pub trait StatusSource: Send + Sync + Debug {
    /// Fetch the raw payload for `server`.
    ///
    /// Implementations must not retry; a failure is reported once and the
    /// orchestrator decides what happens next.
    async fn fetch(&self, server: &ServerConfig) -> Result<Value, FetchError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
