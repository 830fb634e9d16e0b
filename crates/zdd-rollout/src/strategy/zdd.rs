//! deploy-zdd: rename the running version aside, push the new one stopped,
//! scale over from old to new, delete the old one.

use tracing::info;

use super::{CommandRunnable, ZDD_DEPLOY, require_new_app, scale_over_step, venerable_name};
use crate::args::CommandArgs;
use crate::error::RolloutResult;
use crate::ops::Operations;
use crate::report::DeployReport;
use crate::scaleover::{ScaleOverRequest, Scaleover};

pub const DEFAULT_ZDD_DURATION: &str = "480s";

pub struct ZddDeploy<'a> {
    ops: &'a dyn Operations,
    scaleover: &'a dyn Scaleover,
    default_duration: String,
}

impl<'a> ZddDeploy<'a> {
    pub fn new(ops: &'a dyn Operations, scaleover: &'a dyn Scaleover) -> Self {
        Self {
            ops,
            scaleover,
            default_duration: DEFAULT_ZDD_DURATION.to_string(),
        }
    }

    /// Scale-over duration used when `--duration` is absent.
    pub fn with_default_duration(mut self, duration: &str) -> Self {
        self.default_duration = duration.to_string();
        self
    }
}

impl CommandRunnable for ZddDeploy<'_> {
    fn name(&self) -> &'static str {
        ZDD_DEPLOY
    }

    fn run(&self, args: &CommandArgs) -> RolloutResult<DeployReport> {
        let app = require_new_app(args)?;
        let mut report = DeployReport::new(ZDD_DEPLOY);
        let duration = args
            .duration()
            .unwrap_or(self.default_duration.as_str())
            .to_string();

        let versions = self.ops.deployed_versions(app);
        info!(%app, ?versions, "found application versions");

        if versions.is_empty() {
            info!(%app, "initial deployment");
            report.record(
                format!("push {app}"),
                self.ops
                    .push_application(app, args.artifact(), args.manifest(), &[]),
            );
            return Ok(report);
        }

        let venerable = if versions.iter().any(|v| v == app) {
            let venerable = venerable_name(app);
            report.record(
                format!("rename {app} {venerable}"),
                self.ops.rename_application(app, &venerable),
            );
            venerable
        } else {
            versions[0].clone()
        };
        info!(%venerable, "venerable version assigned");

        report.record(
            format!("push {app}"),
            self.ops.push_application(
                app,
                args.artifact(),
                args.manifest(),
                &["-i", "1", "--no-start"],
            ),
        );

        let request = ScaleOverRequest {
            old_app: venerable.clone(),
            new_app: app.to_string(),
            duration: Some(duration),
            custom_url: args.custom_url().map(str::to_string),
            enforce_routes: args.enforce_routes,
        };
        scale_over_step(&mut report, self.scaleover, &request)?;

        info!(%venerable, "removing old version");
        report.record(format!("delete {venerable}"), self.ops.remove_application(&venerable));
        Ok(report)
    }
}
