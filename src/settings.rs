//! Settings and server-list loading.
//!
//! Settings are layered with the `config` crate, later layers winning:
//!
//! 1. built-in defaults (`interval_secs = 60`, `timeout_secs = 10`)
//! 2. an optional settings file in any format `config` understands
//! 3. `STATUSWATCH_*` environment variables (e.g. `STATUSWATCH_INTERVAL_SECS`)
//! 4. command-line overrides
//!
//! Server lists are JSON files in either of two shapes:
//!
//! ```json
//! [{ "name": "EU #1", "url": "http://eu1.example/api/status" }]
//! ```
//!
//! ```json
//! { "servers": [{ "id": "eu-1", "name": "EU #1", "apiUrl": "http://eu1.example/api/status" }] }
//! ```
//!
//! The endpoint may be given as `apiUrl`, `url` or `endpoint`. A missing `id`
//! is derived from the name. Validation reports every problem at once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use statuswatch_types::ServerConfig;

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading settings or server lists.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The server list file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The server list file is not in a recognized shape.
    #[error("{} is not a valid server list: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Layered settings could not be built or deserialized.
    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// One or more validation problems.
    #[error("invalid configuration:\n- {}", .0.join("\n- "))]
    Invalid(Vec<String>),
}

/// One server entry as written in a settings or server-list file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "apiUrl", alias = "apiurl", alias = "url")]
    pub endpoint: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServerFile {
    List(Vec<ServerEntry>),
    Wrapped { servers: Vec<ServerEntry> },
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub servers_file: Option<PathBuf>,
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    #[serde(default)]
    pub servers_file: Option<PathBuf>,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Settings {
    /// Load layered settings.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("interval_secs", DEFAULT_INTERVAL_SECS)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("STATUSWATCH").try_parsing(true))
            .set_override_option("interval_secs", overrides.interval_secs)?
            .set_override_option("timeout_secs", overrides.timeout_secs)?
            .set_override_option(
                "servers_file",
                overrides
                    .servers_file
                    .as_ref()
                    .map(|p| p.display().to_string()),
            )?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        if self.interval_secs == 0 {
            problems.push("interval_secs must be at least 1".to_string());
        }
        if self.timeout_secs == 0 {
            problems.push("timeout_secs must be at least 1".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The validated server list: entries from `servers_file` followed by
    /// inline `servers`.
    pub fn load_servers(&self) -> Result<Vec<ServerConfig>, ConfigError> {
        let mut entries = match &self.servers_file {
            Some(path) => read_server_file(path)?,
            None => Vec::new(),
        };
        entries.extend(self.servers.iter().cloned());
        resolve_servers(entries)
    }
}

/// Read and validate a server list file.
pub fn load_servers_file(path: &Path) -> Result<Vec<ServerConfig>, ConfigError> {
    resolve_servers(read_server_file(path)?)
}

fn read_server_file(path: &Path) -> Result<Vec<ServerEntry>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_server_list(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse either server list shape.
pub fn parse_server_list(raw: &str) -> Result<Vec<ServerEntry>, serde_json::Error> {
    Ok(match serde_json::from_str(raw)? {
        ServerFile::List(entries) => entries,
        ServerFile::Wrapped { servers } => servers,
    })
}

/// Validate entries and turn them into server configs.
///
/// Every problem is collected before failing.
pub fn resolve_servers(entries: Vec<ServerEntry>) -> Result<Vec<ServerConfig>, ConfigError> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.into_iter().enumerate() {
        let at = format!("servers[{}]", idx);
        let name = entry.name.trim().to_string();
        let endpoint = entry.endpoint.trim().to_string();
        let id = match entry.id {
            Some(id) => id.trim().to_string(),
            None => slug(&name),
        };

        if name.is_empty() {
            problems.push(format!("{}.name must be a non-empty string", at));
        }
        if id.is_empty() {
            problems.push(format!("{}.id must be a non-empty string", at));
        } else if !seen.insert(id.clone()) {
            problems.push(format!("{}.id duplicates id \"{}\"", at, id));
        }
        if endpoint.is_empty() {
            problems.push(format!("{}.endpoint must be a non-empty string", at));
        } else if !is_http_url(&endpoint) {
            problems.push(format!(
                "{}.endpoint \"{}\" is not an absolute http(s) URL",
                at, endpoint
            ));
        }

        servers.push(ServerConfig::new(id, name, endpoint));
    }

    if problems.is_empty() {
        Ok(servers)
    } else {
        Err(ConfigError::Invalid(problems))
    }
}

fn is_http_url(endpoint: &str) -> bool {
    reqwest::Url::parse(endpoint)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Lower-case identifier derived from a display name (`"EU #1"` becomes `"eu-1"`).
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
