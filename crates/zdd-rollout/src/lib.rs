//! cf-zdd rollouts: the scale-over engine and the deployment strategies
//! built on top of it.
//!
//! Everything here talks to the platform through
//! [`zdd_core::PlatformClient`], so the whole crate runs unchanged against
//! the real `cf` binary or the in-memory fake.
//!
//! # Components
//!
//! - **`status`**: `AppStatus` snapshot with scale up / scale down
//! - **`scaleover`**: the paced instance hand-over between two apps
//! - **`ops`**: push, rename, remap, delete and friends
//! - **`strategy`**: deploy-canary, promote-canary, blue-green, deploy-zdd, scaleover
//! - **`report`**: per-step record of what a strategy did

pub mod args;
pub mod error;
pub mod ops;
pub mod report;
pub mod scaleover;
pub mod status;
pub mod strategy;

pub use args::CommandArgs;
pub use error::{RolloutError, RolloutResult};
pub use ops::{CommonCommands, Operations};
pub use report::{DeployReport, StepOutcome, StepRecord};
pub use scaleover::{ScaleOver, ScaleOverOutcome, ScaleOverRequest, Scaleover, SleepFn};
pub use status::AppStatus;
pub use strategy::{
    BLUE_GREEN, BlueGreen, CANARY_DEPLOY, CANARY_PROMOTE, CanaryDeploy, CanaryPromote,
    CommandRunnable, DEFAULT_ZDD_DURATION, SCALEOVER, ScaleOverCommand, ZDD_DEPLOY, ZddDeploy,
    canary_route_name,
};
