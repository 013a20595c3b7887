//! Server descriptions supplied by the configuration layer.

use std::fmt;

/// Immutable description of one monitored server.
///
/// Created once when the configuration is loaded and never mutated by the
/// poller; each round borrows the current list read-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ServerConfig {
    /// Unique, stable, non-empty identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL polled for the server's statistics.
    pub endpoint: String,
}

impl ServerConfig {
    /// Create a server description.
    pub fn new(id: impl Into<String>, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
