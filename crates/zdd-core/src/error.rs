//! Error types for platform access.

use thiserror::Error;

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors raised while talking to the platform control plane.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("App {0} not found")]
    AppNotFound(String),

    #[error("`{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("failed to execute '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected platform response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no space targeted, run `cf target -s <space>` first")]
    NotTargeted,

    #[error("{0}")]
    InvalidArgument(String),
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Decode(err.to_string())
    }
}
