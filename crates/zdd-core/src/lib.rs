//! zdd-core: shared building blocks for cf-zdd.
//!
//! - **`platform`**: the `PlatformClient` seam every remote call goes through
//! - **`cf`**: `PlatformClient` backed by the `cf` binary
//! - **`types`**: application, route and lifecycle types
//! - **`duration`**: rollover duration parsing
//! - **`manifest`**: routing domains from `manifest.yml`
//! - **`config`**: the optional `zdd.toml` tool config

pub mod cf;
pub mod config;
pub mod duration;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use cf::CfCli;
pub use config::ZddConfig;
pub use duration::{DurationError, parse_duration};
pub use error::{PlatformError, PlatformResult};
pub use manifest::Manifest;
pub use platform::PlatformClient;
pub use types::*;
