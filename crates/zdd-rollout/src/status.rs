//! Point-in-time snapshot of one application, and the two mutators the
//! scale-over engine steps it with.

use serde::Serialize;
use tracing::debug;

use zdd_core::{LifecycleState, PlatformClient, PlatformError, PlatformResult, RouteModel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStatus {
    pub name: String,
    pub guid: String,
    pub state: LifecycleState,
    /// Instances instructed; 0 while stopped.
    pub count_requested: u32,
    /// Running instances observed at fetch time.
    pub count_running: u32,
    /// `host.domain` strings in platform order.
    pub routes: Vec<String>,
}

impl AppStatus {
    /// Fetch the current state of `name`. Lookup errors are returned as-is.
    pub fn fetch(platform: &dyn PlatformClient, name: &str) -> PlatformResult<Self> {
        let app = platform.get_app(name)?;
        let count_requested = if app.state == LifecycleState::Stopped {
            0
        } else {
            app.instance_count
        };
        Ok(Self {
            name: name.to_string(),
            guid: app.guid,
            state: app.state,
            count_requested,
            count_running: app.running_instances,
            routes: app.routes.iter().map(RouteModel::url).collect(),
        })
    }

    /// Add one instance, starting the app first if it is not running.
    pub fn scale_up(&mut self, platform: &dyn PlatformClient) -> PlatformResult<()> {
        if self.state != LifecycleState::Started {
            platform.cli_command_silent(&["start", &self.name])?;
            self.state = LifecycleState::Started;
        }
        let target = self.count_requested + 1;
        scale(platform, &self.name, target)?;
        self.count_requested = target;
        Ok(())
    }

    /// Remove one instance, stopping the app instead of scaling it to zero.
    pub fn scale_down(&mut self, platform: &dyn PlatformClient) -> PlatformResult<()> {
        let Some(target) = self.count_requested.checked_sub(1) else {
            return Err(PlatformError::InvalidArgument(format!(
                "{} has no instances left to scale down",
                self.name
            )));
        };
        if target == 0 {
            platform.cli_command_silent(&["stop", &self.name])?;
            self.state = LifecycleState::Stopped;
        } else {
            scale(platform, &self.name, target)?;
        }
        self.count_requested = target;
        Ok(())
    }

    /// Whether the two apps have at least one route in common.
    pub fn shares_route_with(&self, other: &AppStatus) -> bool {
        self.routes.iter().any(|r| other.routes.contains(r))
    }
}

fn scale(platform: &dyn PlatformClient, name: &str, instances: u32) -> PlatformResult<()> {
    debug!(app = %name, instances, "scaling");
    let count = instances.to_string();
    platform.cli_command_silent(&["scale", "-i", &count, name])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdd_core::fake::FakePlatform;

    #[test]
    fn fetch_missing_app_propagates_error() {
        let fake = FakePlatform::new();
        let err = AppStatus::fetch(&fake, "app1").unwrap_err();
        assert_eq!(err.to_string(), "App app1 not found");
    }

    #[test]
    fn fetch_stopped_app_requests_zero() {
        let fake = FakePlatform::new().with_app("app1", LifecycleState::Stopped, 1, &[]);
        let status = AppStatus::fetch(&fake, "app1").unwrap();
        assert_eq!(status.name, "app1");
        assert_eq!(status.count_requested, 0);
        assert_eq!(status.count_running, 0);
        assert_eq!(status.state, LifecycleState::Stopped);
    }

    #[test]
    fn fetch_started_app_with_routes() {
        let fake = FakePlatform::new().with_app(
            "app1",
            LifecycleState::Started,
            10,
            &[("host", "cfapps.io"), ("host1", "cfapps.io")],
        );
        let status = AppStatus::fetch(&fake, "app1").unwrap();
        assert_eq!(status.count_requested, 10);
        assert_eq!(status.count_running, 10);
        assert_eq!(status.routes, vec!["host.cfapps.io", "host1.cfapps.io"]);
    }

    #[test]
    fn scale_up_starts_stopped_app_once() {
        let fake = FakePlatform::new().with_app("b", LifecycleState::Stopped, 1, &[]);
        let mut status = AppStatus::fetch(&fake, "b").unwrap();
        status.scale_up(&fake).unwrap();
        status.scale_up(&fake).unwrap();
        assert_eq!(status.count_requested, 2);
        assert_eq!(status.state, LifecycleState::Started);
        assert_eq!(fake.lines(), vec!["start b", "scale -i 1 b", "scale -i 2 b"]);
    }

    #[test]
    fn scale_down_stops_at_zero() {
        let fake = FakePlatform::new().with_app("a", LifecycleState::Started, 2, &[]);
        let mut status = AppStatus::fetch(&fake, "a").unwrap();
        status.scale_down(&fake).unwrap();
        status.scale_down(&fake).unwrap();
        assert_eq!(status.count_requested, 0);
        assert_eq!(status.state, LifecycleState::Stopped);
        assert_eq!(fake.lines(), vec!["scale -i 1 a", "stop a"]);
        assert!(fake.invocations().iter().all(|i| i.silent));
    }

    #[test]
    fn scale_down_below_zero_is_refused() {
        let fake = FakePlatform::new().with_app("a", LifecycleState::Stopped, 0, &[]);
        let mut status = AppStatus::fetch(&fake, "a").unwrap();
        assert!(status.scale_down(&fake).is_err());
        assert!(fake.lines().is_empty());
    }

    #[test]
    fn failed_scale_keeps_previous_count() {
        let fake = FakePlatform::new()
            .with_app("a", LifecycleState::Started, 1, &[])
            .failing("scale");
        let mut status = AppStatus::fetch(&fake, "a").unwrap();
        assert!(status.scale_up(&fake).is_err());
        assert_eq!(status.count_requested, 1);
    }

    #[test]
    fn route_sharing() {
        let fake = FakePlatform::new()
            .with_app("a", LifecycleState::Started, 1, &[("a", "b.c"), ("b", "c.d")])
            .with_app("b", LifecycleState::Started, 1, &[("c", "d.e"), ("d", "e.f")])
            .with_app("c", LifecycleState::Started, 1, &[("c", "d.e"), ("a", "b.c")]);
        let a = AppStatus::fetch(&fake, "a").unwrap();
        let b = AppStatus::fetch(&fake, "b").unwrap();
        let c = AppStatus::fetch(&fake, "c").unwrap();
        assert!(!a.shares_route_with(&b));
        assert!(a.shares_route_with(&c));
    }
}
