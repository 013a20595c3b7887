//! Error types for status sources.

use thiserror::Error;

/// Why a single server could not produce a usable status payload.
///
/// None of these escape the fetcher: each becomes an `Error` record whose
/// `error_detail` is [`FetchError::detail`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("network failure: {0}")]
    Network(String),

    /// The request exceeded its time bound.
    #[error("request timed out")]
    Timeout,

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned HTTP {0}")]
    Protocol(u16),

    /// The body is not valid JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Valid JSON without any recognizable domain field.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl FetchError {
    /// Short machine-readable cause stored in `error_detail`.
    pub fn detail(&self) -> String {
        match self {
            FetchError::Network(_) => "unreachable".to_string(),
            FetchError::Timeout => "timeout".to_string(),
            FetchError::Protocol(code) => format!("http {}", code),
            FetchError::Decode(_) => "invalid json".to_string(),
            FetchError::SchemaMismatch(reason) => format!("schema mismatch: {}", reason),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Protocol(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
