//! HTTP status source.
//!
//! Issues one `GET` per fetch with `Accept: application/json`, checks the
//! status code and decodes the body as JSON. Nothing else is interpreted here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;

use statuswatch_types::ServerConfig;

use super::{FetchError, StatusSource};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status source backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::default()
    }

    /// The per-request timeout applied by the client.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl StatusSource for HttpSource {
    async fn fetch(&self, server: &ServerConfig) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(&server.endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn description(&self) -> &str {
        "http"
    }
}

/// Builder for HttpSource.
#[derive(Debug)]
pub struct HttpSourceBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    system_proxy: bool,
}

impl Default for HttpSourceBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: None,
            system_proxy: true,
        }
    }
}

impl HttpSourceBuilder {
    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the `User-Agent` header (default: `statuswatch/<version>`).
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Ignore proxy settings from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.system_proxy = false;
        self
    }

    /// Build the source. Fails only if the TLS backend cannot be initialized.
    pub fn build(self) -> Result<HttpSource, reqwest::Error> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("statuswatch/{}", env!("CARGO_PKG_VERSION")));

        let mut builder = Client::builder().timeout(timeout).user_agent(user_agent);
        if !self.system_proxy {
            builder = builder.no_proxy();
        }
        Ok(HttpSource {
            client: builder.build()?,
            timeout,
        })
    }
}
