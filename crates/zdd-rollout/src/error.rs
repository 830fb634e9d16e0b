//! Rollout error types.
//!
//! Every variant here is fatal: the command stops and the process exits
//! non-zero. Failures of individual steps inside a strategy are not errors,
//! they are recorded in the [`crate::report::DeployReport`].

use thiserror::Error;
use zdd_core::{DurationError, PlatformError};

pub type RolloutResult<T> = Result<T, RolloutError>;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    InvalidDuration(#[from] DurationError),

    #[error("{source}")]
    AppNotFound {
        name: String,
        #[source]
        source: PlatformError,
    },

    #[error("Apps do not share a route! ({old} and {new})")]
    NoSharedRoute { old: String, new: String },

    #[error("scale-over step {step} failed on {app}: {source}")]
    Step {
        step: u32,
        app: String,
        #[source]
        source: PlatformError,
    },
}

impl RolloutError {
    pub fn app_not_found(name: &str, source: PlatformError) -> Self {
        RolloutError::AppNotFound {
            name: name.to_string(),
            source,
        }
    }
}
