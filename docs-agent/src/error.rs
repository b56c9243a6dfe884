//! Error types for the documentation pipeline
//!
//! Library seams return these typed errors; phase bodies and the binary work
//! in `anyhow::Result` and attach context as they go.

use crate::pipeline::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single capability invocation
///
/// The coordinator treats every variant the same way: the work item's
/// outcome is marked failed with the rendered message. No variant is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited by provider (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("capability call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("provider misconfigured: {0}")]
    Configuration(String),
}

/// Failure reading from the repository under analysis
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("{path} is {size} bytes, limit is {limit}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// Failure persisting or loading a handoff artifact
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("handoff I/O failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {phase} artifact")]
    Serialize {
        phase: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("artifact {path} does not match the expected document shape")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A load-bearing phase could not produce its document; the run halts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{phase} phase failed: {cause}")]
pub struct PhaseFailure {
    pub phase: Phase,
    pub cause: String,
}

impl PhaseFailure {
    pub fn new(phase: Phase, cause: &anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        Self {
            phase,
            cause: format!("{:#}", cause),
        }
    }
}
