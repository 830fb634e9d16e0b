//! Deployment strategies: canary, blue-green, zdd and plain scale-over.
//!
//! Each strategy is a fixed sequence of platform operations. Intermediate
//! failures are recorded in the returned [`DeployReport`] and the sequence
//! carries on; only argument problems and scale-over failures stop it.

mod blue_green;
mod canary;
mod zdd;

pub use blue_green::{BlueGreen, are_all_instances_started};
pub use canary::{CanaryDeploy, CanaryPromote};
pub use zdd::{DEFAULT_ZDD_DURATION, ZddDeploy};

use crate::args::CommandArgs;
use crate::error::{RolloutError, RolloutResult};
use crate::report::DeployReport;
use crate::scaleover::{ScaleOverOutcome, ScaleOverRequest, Scaleover};

pub const CANARY_DEPLOY: &str = "deploy-canary";
pub const CANARY_PROMOTE: &str = "promote-canary";
pub const BLUE_GREEN: &str = "blue-green";
pub const ZDD_DEPLOY: &str = "deploy-zdd";
pub const SCALEOVER: &str = "scaleover";

/// Suffix given to the previous version while it is replaced.
pub const VENERABLE_SUFFIX: &str = "venerable";

const CANARY_ROUTE_SUFFIX: &str = "canary";
const CANARY_ROUTE_SEPARATOR: &str = "-";

/// A command the dispatcher can run against a parsed argument record.
pub trait CommandRunnable {
    fn name(&self) -> &'static str;
    fn run(&self, args: &CommandArgs) -> RolloutResult<DeployReport>;
}

/// Host name of the canary route for `app`: `.` and `#` become `-`, then
/// `-canary` is appended. `myApp#1.2.3` gives `myApp-1-2-3-canary`.
pub fn canary_route_name(app: &str) -> String {
    let host = app.replace(['.', '#'], CANARY_ROUTE_SEPARATOR);
    format!("{host}{CANARY_ROUTE_SEPARATOR}{CANARY_ROUTE_SUFFIX}")
}

pub fn venerable_name(app: &str) -> String {
    format!("{app}-{VENERABLE_SUFFIX}")
}

fn require_new_app(args: &CommandArgs) -> RolloutResult<&str> {
    if args.new_app.is_empty() {
        return Err(RolloutError::Usage("--new-app is required".to_string()));
    }
    Ok(&args.new_app)
}

fn scale_over_step(
    report: &mut DeployReport,
    scaleover: &dyn Scaleover,
    request: &ScaleOverRequest,
) -> RolloutResult<ScaleOverOutcome> {
    let outcome = scaleover.scale_over(request)?;
    let action = match &outcome {
        ScaleOverOutcome::NothingToScale { .. } => format!(
            "scale-over {} -> {} (nothing to scale)",
            request.old_app, request.new_app
        ),
        ScaleOverOutcome::Completed { steps, .. } => format!(
            "scale-over {} -> {} ({steps} steps)",
            request.old_app, request.new_app
        ),
    };
    report.record(action, Ok::<(), String>(()));
    Ok(outcome)
}

/// `scaleover`: move instances from `--old-app` to `--new-app`.
pub struct ScaleOverCommand<'a> {
    scaleover: &'a dyn Scaleover,
}

impl<'a> ScaleOverCommand<'a> {
    pub fn new(scaleover: &'a dyn Scaleover) -> Self {
        Self { scaleover }
    }
}

impl CommandRunnable for ScaleOverCommand<'_> {
    fn name(&self) -> &'static str {
        SCALEOVER
    }

    fn run(&self, args: &CommandArgs) -> RolloutResult<DeployReport> {
        let mut report = DeployReport::new(SCALEOVER);
        scale_over_step(&mut report, self.scaleover, &ScaleOverRequest::from_args(args))?;
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;
    use crate::status::AppStatus;
    use zdd_core::LifecycleState;

    /// Records requests and answers `Completed` without touching a platform.
    #[derive(Default)]
    pub struct StubScaleover {
        pub requests: RefCell<Vec<ScaleOverRequest>>,
        pub fail: bool,
    }

    impl Scaleover for StubScaleover {
        fn scale_over(&self, request: &ScaleOverRequest) -> RolloutResult<ScaleOverOutcome> {
            self.requests.borrow_mut().push(request.clone());
            if self.fail {
                return Err(RolloutError::NoSharedRoute {
                    old: request.old_app.clone(),
                    new: request.new_app.clone(),
                });
            }
            let status = |name: &str| AppStatus {
                name: name.to_string(),
                guid: String::new(),
                state: LifecycleState::Started,
                count_requested: 1,
                count_running: 1,
                routes: Vec::new(),
            };
            Ok(ScaleOverOutcome::Completed {
                steps: 1,
                interval: std::time::Duration::ZERO,
                old: status(&request.old_app),
                new: status(&request.new_app),
            })
        }
    }
}
