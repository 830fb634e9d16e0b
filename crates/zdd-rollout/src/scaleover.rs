//! Scale-over engine: moves instances from an old app to a new one.
//!
//! The engine fetches fresh snapshots of both apps, checks that they share a
//! route, then runs one step per instance of the old app: the new app gains
//! an instance, the old app loses one, and the engine waits
//! `duration / count` before the next step. After the last step the old app
//! is stopped and the new app runs the old app's former instance count.
//!
//! A failing remote call inside a step stops the loop; the apps are left in
//! the split reached by the last completed step.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use zdd_core::{PlatformClient, parse_duration};

use crate::args::CommandArgs;
use crate::error::{RolloutError, RolloutResult};
use crate::status::AppStatus;

/// Parameters of one scale-over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleOverRequest {
    pub old_app: String,
    pub new_app: String,
    pub duration: Option<String>,
    pub custom_url: Option<String>,
    pub enforce_routes: bool,
}

impl ScaleOverRequest {
    pub fn from_args(args: &CommandArgs) -> Self {
        Self {
            old_app: args.old_app.clone(),
            new_app: args.new_app.clone(),
            duration: args.duration().map(str::to_string),
            custom_url: args.custom_url().map(str::to_string),
            enforce_routes: args.enforce_routes,
        }
    }

    /// Check required arguments and parse the duration.
    pub fn validate(&self) -> RolloutResult<Duration> {
        if self.old_app.is_empty() || self.new_app.is_empty() {
            return Err(RolloutError::Usage(
                "App 1 and App2 are required".to_string(),
            ));
        }
        if self.custom_url.is_none() && self.duration.is_none() {
            return Err(RolloutError::Usage(
                "Custom URL or Duration is required".to_string(),
            ));
        }
        if self.custom_url.is_some() {
            warn!("custom health-check URL is not used for pacing, stepping by duration");
        }
        Ok(parse_duration(self.duration.as_deref().unwrap_or_default())?)
    }
}

/// How a scale-over ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScaleOverOutcome {
    /// The old app had no requested instances; nothing was changed.
    NothingToScale { old: AppStatus, new: AppStatus },
    /// Every instance was moved.
    Completed {
        steps: u32,
        #[serde(with = "duration_millis")]
        interval: Duration,
        old: AppStatus,
        new: AppStatus,
    },
}

/// Anything that can perform a scale-over. Strategies depend on this rather
/// than on the engine so they can be tested with a stub.
pub trait Scaleover {
    fn scale_over(&self, request: &ScaleOverRequest) -> RolloutResult<ScaleOverOutcome>;
}

pub type SleepFn = Box<dyn Fn(Duration)>;

pub struct ScaleOver<'a> {
    platform: &'a dyn PlatformClient,
    sleep_fn: SleepFn,
    interactive: bool,
    quiet: bool,
}

impl<'a> ScaleOver<'a> {
    pub fn new(platform: &'a dyn PlatformClient) -> Self {
        Self {
            platform,
            sleep_fn: Box::new(std::thread::sleep),
            interactive: std::io::stdout().is_terminal(),
            quiet: false,
        }
    }

    /// Replace the pause between steps.
    pub fn with_sleep_fn(mut self, f: SleepFn) -> Self {
        self.sleep_fn = f;
        self
    }

    /// Force the progress style instead of detecting a terminal.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Keep stdout free of progress lines, e.g. when it carries a JSON report.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn fetch(&self, name: &str) -> RolloutResult<AppStatus> {
        AppStatus::fetch(self.platform, name).map_err(|e| RolloutError::app_not_found(name, e))
    }

    fn show_status(&self, old: &AppStatus, new: &AppStatus) {
        if self.quiet {
            return;
        }
        let line = format_status(old, new, self.interactive);
        let mut stdout = std::io::stdout();
        // Progress output is best-effort; a closed stdout must not abort a cut-over.
        if self.interactive {
            let _ = write!(stdout, "{line}");
        } else {
            let _ = writeln!(stdout, "{line}");
        }
        let _ = stdout.flush();
    }
}

impl Scaleover for ScaleOver<'_> {
    fn scale_over(&self, request: &ScaleOverRequest) -> RolloutResult<ScaleOverOutcome> {
        let total = request.validate()?;

        let mut old = self.fetch(&request.old_app)?;
        let mut new = self.fetch(&request.new_app)?;
        debug!(?old, ?new, "fetched scale-over snapshots");

        if request.enforce_routes && !old.shares_route_with(&new) {
            return Err(RolloutError::NoSharedRoute {
                old: old.name,
                new: new.name,
            });
        }

        self.show_status(&old, &new);

        let count = old.count_requested;
        if count == 0 {
            if !self.quiet {
                println!("There are no instances of the source app to scale over");
            }
            info!(old = %old.name, "source app has no instances");
            return Ok(ScaleOverOutcome::NothingToScale { old, new });
        }

        let interval = step_interval(total, count);
        info!(
            old = %old.name,
            new = %new.name,
            count,
            interval_ms = interval.as_millis() as u64,
            "starting scale-over"
        );

        let mut remaining = count;
        let mut step = 0;
        while remaining > 0 {
            remaining -= 1;
            step += 1;

            new.scale_up(self.platform).map_err(|source| RolloutError::Step {
                step,
                app: new.name.clone(),
                source,
            })?;
            old.scale_down(self.platform).map_err(|source| RolloutError::Step {
                step,
                app: old.name.clone(),
                source,
            })?;

            self.show_status(&old, &new);
            debug!(step, remaining, "scale-over step done");

            if remaining > 0 {
                (self.sleep_fn)(interval);
            }
        }

        if self.interactive && !self.quiet {
            println!();
        }
        info!(old = %old.name, new = %new.name, steps = step, "scale-over completed");

        Ok(ScaleOverOutcome::Completed {
            steps: step,
            interval,
            old,
            new,
        })
    }
}

/// Pause between steps: `total / count`, truncated to whole nanoseconds.
/// Rounds to zero when `count` exceeds the duration's nanoseconds.
pub fn step_interval(total: Duration, count: u32) -> Duration {
    if count == 0 {
        return total;
    }
    total / count
}

/// One progress line. Interactive terminals get a glyph bar redrawn in place,
/// anything else gets an instance-count summary.
pub fn format_status(old: &AppStatus, new: &AppStatus, interactive: bool) -> String {
    if interactive {
        format!(
            "{} ({}) {} {} {} ({}) \r",
            old.name,
            old.state,
            "<".repeat(old.count_requested as usize),
            ">".repeat(new.count_requested as usize),
            new.name,
            new.state,
        )
    } else {
        format!(
            "{} ({}) {} instances, {} ({}) {} instances",
            old.name, old.state, old.count_requested, new.name, new.state, new.count_requested,
        )
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
