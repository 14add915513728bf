//! Error taxonomy for parkdaily
//!
//! Each infrastructure concern gets its own `thiserror` enum; `DigestError`
//! rolls them up for the CLI layer. Provider fetch failures use `FetchError`,
//! which carries a kind so the retry wrapper can classify transience.

use std::io;

use thiserror::Error;

/// Classification of a provider fetch failure.
///
/// The retry wrapper re-invokes only on kinds listed in the active
/// [`RetryPolicy`](crate::retry::RetryPolicy); everything else propagates
/// immediately to the timing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection refused/reset, DNS failure, request timeout.
    Network,
    /// Upstream returned 429 or an equivalent throttle signal.
    RateLimited,
    /// Response arrived but could not be decoded.
    Parse,
    /// Upstream returned a 5xx or an application-level error payload.
    Upstream,
    /// Anything else; never retried.
    Other,
}

/// A provider-level fetch failure.
///
/// Providers must NOT construct one of these for expected absence of data
/// ("no events today" is a successful, empty result).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Parse, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Upstream, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Other, message)
    }

    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() {
            FetchErrorKind::Network
        } else if err.status().map(|s| s.as_u16()) == Some(429) {
            FetchErrorKind::RateLimited
        } else if err.status().is_some_and(|s| s.is_server_error()) {
            FetchErrorKind::Upstream
        } else if err.is_decode() {
            FetchErrorKind::Parse
        } else {
            FetchErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Startup configuration failures. Always fatal before any module runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", missing.join(", "))]
    MissingVars { missing: Vec<String> },

    #[error("failed to read env file '{path}': {source}")]
    EnvFile {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Run lock failures. Contention is NOT an error (`acquire` returns `None`).
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to acquire run lock: {reason}")]
    AcquisitionFailed { reason: String },

    #[error("IO error during lock operation: {0}")]
    Io(#[from] io::Error),
}

/// LKG cache backing-store failures.
///
/// A corrupt store at open time is self-healed, not surfaced; errors here
/// are for operations against an already-open store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("LKG store error: {0}")]
    Store(String),
}

/// Status history read/write failures.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write status history: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize status history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot publication failures.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to write snapshot: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("published snapshot failed verification: {0}")]
    Verification(String),
}

/// Top-level error type for the CLI layer.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_carries_kind() {
        let err = FetchError::rate_limited("429 from upstream");
        assert_eq!(err.kind(), FetchErrorKind::RateLimited);
        assert_eq!(err.to_string(), "429 from upstream");
    }

    #[test]
    fn missing_vars_lists_all_names() {
        let err = ConfigError::MissingVars {
            missing: vec!["NPS_API_KEY".to_string(), "OTHER".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("NPS_API_KEY"));
        assert!(msg.contains("OTHER"));
    }
}
