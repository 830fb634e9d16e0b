//! Canary deploy and canary promote.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use zdd_core::manifest::DEFAULT_MANIFEST;
use zdd_core::{Manifest, PlatformClient, PlatformResult};

use super::{
    CANARY_DEPLOY, CANARY_PROMOTE, CommandRunnable, canary_route_name, require_new_app,
    scale_over_step,
};
use crate::args::CommandArgs;
use crate::error::{RolloutError, RolloutResult};
use crate::ops::Operations;
use crate::report::DeployReport;
use crate::scaleover::{ScaleOverRequest, Scaleover};

/// `deploy-canary`: push a single unrouted instance, give it a
/// `<app>-canary` route on every manifest domain, then start it.
pub struct CanaryDeploy<'a> {
    platform: &'a dyn PlatformClient,
    ops: &'a dyn Operations,
    default_manifest: PathBuf,
}

impl<'a> CanaryDeploy<'a> {
    pub fn new(platform: &'a dyn PlatformClient, ops: &'a dyn Operations) -> Self {
        Self {
            platform,
            ops,
            default_manifest: PathBuf::from(DEFAULT_MANIFEST),
        }
    }

    /// Manifest consulted when `-f` is not given.
    pub fn with_default_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_manifest = path.into();
        self
    }

    /// Domains for the canary route: the manifest's `domains` then `domain`,
    /// or the platform default domain when the manifest has none.
    pub fn resolve_domains(&self, manifest_path: Option<&str>) -> PlatformResult<Vec<String>> {
        let path = match manifest_path {
            Some(p) => Some(PathBuf::from(p)),
            None if self.default_manifest.is_file() => Some(self.default_manifest.clone()),
            None => None,
        };

        if let Some(path) = path {
            match read_domains(&path) {
                Ok(domains) if !domains.is_empty() => return Ok(domains),
                Ok(_) => info!(manifest = %path.display(), "manifest names no domain"),
                Err(e) => warn!(manifest = %path.display(), error = %e, "cannot read manifest"),
            }
        }

        info!("using the platform default domain");
        Ok(vec![self.ops.default_domain()?])
    }
}

fn read_domains(path: &Path) -> anyhow::Result<Vec<String>> {
    Ok(Manifest::from_file(path)?.route_domains())
}

impl CommandRunnable for CanaryDeploy<'_> {
    fn name(&self) -> &'static str {
        CANARY_DEPLOY
    }

    fn run(&self, args: &CommandArgs) -> RolloutResult<DeployReport> {
        let app = require_new_app(args)?;
        let mut report = DeployReport::new(CANARY_DEPLOY);

        report.record(
            format!("push {app}"),
            self.ops.push_application(
                app,
                args.artifact(),
                args.manifest(),
                &["-i", "1", "--no-route", "--no-start"],
            ),
        );

        let host = canary_route_name(app);
        match self.resolve_domains(args.manifest()) {
            Ok(domains) => {
                for domain in domains {
                    report.record(
                        format!("map-route {app} {domain} -n {host}"),
                        self.platform
                            .cli_command(&["map-route", app, &domain, "-n", &host]),
                    );
                }
            }
            Err(e) => {
                report.record("resolve default domain", Err::<(), _>(e));
            }
        }

        report.record(format!("start {app}"), self.platform.cli_command(&["start", app]));
        Ok(report)
    }
}

/// `promote-canary`: hand the production routes to the canary, scale the
/// canary up while the production app scales down, then delete production.
pub struct CanaryPromote<'a> {
    platform: &'a dyn PlatformClient,
    ops: &'a dyn Operations,
    scaleover: &'a dyn Scaleover,
}

impl<'a> CanaryPromote<'a> {
    pub fn new(
        platform: &'a dyn PlatformClient,
        ops: &'a dyn Operations,
        scaleover: &'a dyn Scaleover,
    ) -> Self {
        Self {
            platform,
            ops,
            scaleover,
        }
    }
}

impl CommandRunnable for CanaryPromote<'_> {
    fn name(&self) -> &'static str {
        CANARY_PROMOTE
    }

    fn run(&self, args: &CommandArgs) -> RolloutResult<DeployReport> {
        if args.old_app.is_empty() || args.new_app.is_empty() {
            return Err(RolloutError::Usage(
                "--old-app and --new-app are required".to_string(),
            ));
        }
        let app_name = args.old_app.as_str();
        let canary_name = args.new_app.as_str();

        let app = self
            .platform
            .get_app(app_name)
            .map_err(|e| RolloutError::app_not_found(app_name, e))?;
        let canary = self
            .platform
            .get_app(canary_name)
            .map_err(|e| RolloutError::app_not_found(canary_name, e))?;

        let mut report = DeployReport::new(CANARY_PROMOTE);

        for route in &app.routes {
            report.record(
                format!("map-route {canary_name} {}", route.url()),
                self.platform
                    .cli_command(&["map-route", canary_name, &route.domain, "-n", &route.host]),
            );
        }
        for route in &canary.routes {
            report.record(
                format!("delete-route {}", route.url()),
                self.platform
                    .cli_command(&["delete-route", &route.domain, "-n", &route.host, "-f"]),
            );
        }

        let mut request = ScaleOverRequest::from_args(args);
        request.old_app = app_name.to_string();
        request.new_app = canary_name.to_string();
        scale_over_step(&mut report, self.scaleover, &request)?;

        report.record(format!("delete {app_name}"), self.ops.remove_application(app_name));
        Ok(report)
    }
}
