//! Blue-green: push beside the running version, wait for it, flip routes.

use std::time::Duration;

use tracing::{debug, info};

use zdd_core::PlatformClient;

use super::{BLUE_GREEN, CommandRunnable, require_new_app, venerable_name};
use crate::args::CommandArgs;
use crate::error::RolloutResult;
use crate::ops::Operations;
use crate::report::DeployReport;
use crate::scaleover::SleepFn;

pub struct BlueGreen<'a> {
    platform: &'a dyn PlatformClient,
    ops: &'a dyn Operations,
    poll_interval: Duration,
    sleep_fn: SleepFn,
}

impl<'a> BlueGreen<'a> {
    pub fn new(platform: &'a dyn PlatformClient, ops: &'a dyn Operations) -> Self {
        Self {
            platform,
            ops,
            poll_interval: Duration::from_secs(20),
            sleep_fn: Box::new(std::thread::sleep),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_sleep_fn(mut self, f: SleepFn) -> Self {
        self.sleep_fn = f;
        self
    }

    /// Block until every requested instance of `app` runs. Re-fetches the
    /// app on each poll and never gives up.
    fn wait_for_instances(&self, app: &str) {
        let mut polls = 0u32;
        while !are_all_instances_started(self.platform, app) {
            polls += 1;
            debug!(%app, polls, "instances not all running yet");
            (self.sleep_fn)(self.poll_interval);
        }
        info!(%app, "all instances started");
    }
}

/// True when the platform reports as many running instances as requested.
/// A failed lookup counts as not started.
pub fn are_all_instances_started(platform: &dyn PlatformClient, app: &str) -> bool {
    match platform.get_app(app) {
        Ok(model) => model.instance_count == model.running_instances,
        Err(_) => false,
    }
}

impl CommandRunnable for BlueGreen<'_> {
    fn name(&self) -> &'static str {
        BLUE_GREEN
    }

    fn run(&self, args: &CommandArgs) -> RolloutResult<DeployReport> {
        let app = require_new_app(args)?;
        let mut report = DeployReport::new(BLUE_GREEN);

        let Some(current) = self.ops.is_application_deployed(app) else {
            info!(%app, "application is not deployed, pushing");
            report.record(
                format!("push {app}"),
                self.ops
                    .push_application(app, args.artifact(), args.manifest(), &["--no-route"]),
            );
            return Ok(report);
        };

        let venerable = venerable_name(&current);
        info!(%current, %venerable, "application is deployed, renaming existing version");
        if !report.record(
            format!("rename {current} {venerable}"),
            self.ops.rename_application(&current, &venerable),
        ) {
            return Ok(report);
        }

        if !report.record(
            format!("push {app}"),
            self.ops
                .push_application(app, args.artifact(), args.manifest(), &["--no-route"]),
        ) {
            return Ok(report);
        }

        self.wait_for_instances(app);

        report.record(
            format!("remap routes {venerable} -> {app}"),
            self.ops.remap_routes(&venerable, app),
        );
        report.record(format!("delete {venerable}"), self.ops.remove_application(&venerable));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ops::CommonCommands;
    use crate::report::StepOutcome;
    use zdd_core::LifecycleState;
    use zdd_core::fake::FakePlatform;

    fn args(app: &str) -> CommandArgs {
        CommandArgs {
            new_app: app.to_string(),
            application_path: Some("app.zip".to_string()),
            ..Default::default()
        }
    }

    fn counting_sleep() -> (SleepFn, Rc<RefCell<u32>>) {
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        (Box::new(move |_| *c.borrow_mut() += 1), count)
    }

    #[test]
    fn first_deploy_just_pushes() {
        let fake = FakePlatform::new();
        let ops = CommonCommands::new(&fake);
        let report = BlueGreen::new(&fake, &ops).run(&args("shop")).unwrap();
        assert_eq!(fake.lines(), vec!["push shop -p app.zip --no-route"]);
        assert_eq!(report.steps.len(), 1);
    }

    #[test]
    fn redeploy_renames_waits_remaps_and_removes() {
        let fake = FakePlatform::new()
            .with_app("shop", LifecycleState::Started, 2, &[("shop", "example.com")])
            .with_running_sequence("shop", &[0, 1]);
        let ops = CommonCommands::new(&fake);
        let (sleep, sleeps) = counting_sleep();
        let report = BlueGreen::new(&fake, &ops)
            .with_sleep_fn(sleep)
            .run(&args("shop"))
            .unwrap();

        assert!(report.is_success());
        assert_eq!(
            fake.lines(),
            vec![
                "rename shop shop-venerable",
                "push shop -p app.zip --no-route",
                "map-route shop example.com -n shop",
                "unmap-route shop-venerable example.com -n shop",
                "delete shop-venerable -f",
            ]
        );
        // Pushed with one instance; the primed sequence reports 0 then 1 running.
        assert_eq!(*sleeps.borrow(), 1);
        assert_eq!(fake.app("shop").unwrap().routes.len(), 1);
        assert!(fake.app("shop-venerable").is_none());
    }

    #[test]
    fn poll_refetches_every_time() {
        let fake = FakePlatform::new()
            .with_app("shop", LifecycleState::Started, 1, &[])
            .with_running_sequence("shop", &[0, 0, 0]);
        let ops = CommonCommands::new(&fake);
        let (sleep, sleeps) = counting_sleep();
        BlueGreen::new(&fake, &ops)
            .with_sleep_fn(sleep)
            .run(&args("shop"))
            .unwrap();

        assert_eq!(*sleeps.borrow(), 3);
        // One fresh lookup per readiness poll.
        assert_eq!(fake.get_app_calls("shop"), 4);
    }

    #[test]
    fn failed_rename_aborts_the_sequence() {
        let fake = FakePlatform::new()
            .with_app("shop", LifecycleState::Started, 1, &[])
            .failing("rename");
        let ops = CommonCommands::new(&fake);
        let report = BlueGreen::new(&fake, &ops).run(&args("shop")).unwrap();

        assert_eq!(fake.lines(), vec!["rename shop shop-venerable"]);
        assert!(matches!(report.steps[0].outcome, StepOutcome::Failed { .. }));
    }

    #[test]
    fn readiness_check() {
        let fake = FakePlatform::new()
            .with_app("up", LifecycleState::Started, 3, &[])
            .with_app("down", LifecycleState::Started, 3, &[])
            .with_running_sequence("down", &[2]);
        assert!(are_all_instances_started(&fake, "up"));
        assert!(!are_all_instances_started(&fake, "down"));
        assert!(!are_all_instances_started(&fake, "missing"));
    }
}
