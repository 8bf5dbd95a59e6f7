//! Error types for collection and forwarding.

use thiserror::Error;

/// Failure to obtain a report from the diagnostic tool.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The tool executable does not exist.
    #[error("report tool not found: {path}")]
    NotFound { path: String },

    /// The tool could not be started.
    #[error("failed to run {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but reported failure.
    #[error("{command} exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },

    /// The tool did not finish in time.
    #[error("{command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// A test double has no output for the arguments.
    #[error("no report for arguments {0:?}")]
    NoReport(Vec<String>),
}

/// Failure to forward a snapshot to a backend.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The payload could not be encoded.
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    /// The backend is unreachable or rejected the payload.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl SinkError {
    /// Process exit status reported in single-shot mode.
    pub fn exit_code(&self) -> u8 {
        match self {
            SinkError::Serialization(_) => 2,
            SinkError::Transport(_) => 4,
        }
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using [`CollectorError`].
pub type Result<T> = std::result::Result<T, CollectorError>;
