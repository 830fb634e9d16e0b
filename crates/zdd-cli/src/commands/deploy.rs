//! The deployment subcommands: shared flags, the command registry and
//! report rendering.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use tracing::info;

use zdd_core::{CfCli, PlatformClient, ZddConfig};
use zdd_rollout::{
    BlueGreen, CanaryDeploy, CanaryPromote, CommandArgs, CommandRunnable, CommonCommands,
    DeployReport, Operations, ScaleOver, ScaleOverCommand, Scaleover, ZddDeploy,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Flags shared by every deployment subcommand.
#[derive(Debug, Clone, Args)]
pub struct ZddArgs {
    /// Current application name
    #[arg(long)]
    pub old_app: Option<String>,
    /// New application being deployed
    #[arg(long)]
    pub new_app: Option<String>,
    /// Total scale-over time, e.g. 480s, 2m, 1h30m
    #[arg(long)]
    pub duration: Option<String>,
    /// Path to the application file
    #[arg(short = 'p')]
    pub application_path: Option<String>,
    /// Path to the application manifest
    #[arg(short = 'f')]
    pub manifest_path: Option<String>,
    /// Custom health-check URL
    #[arg(long = "custom-health-url")]
    pub custom_url: Option<String>,
    /// Instances to move per step (informational)
    #[arg(long, default_value_t = 1)]
    pub batch_size: u32,
    /// Skip the shared-route check before scaling over
    #[arg(long)]
    pub no_route_check: bool,
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Tool config file (default: ./zdd.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ZddArgs {
    pub fn to_command_args(&self) -> CommandArgs {
        CommandArgs {
            old_app: self.old_app.clone().unwrap_or_default(),
            new_app: self.new_app.clone().unwrap_or_default(),
            duration: self.duration.clone(),
            application_path: self.application_path.clone(),
            manifest_path: self.manifest_path.clone(),
            custom_url: self.custom_url.clone(),
            batch_size: self.batch_size,
            enforce_routes: !self.no_route_check,
        }
    }
}

/// Commands by name, built once at start-up.
#[derive(Default)]
pub struct Registry<'a> {
    commands: HashMap<&'static str, Box<dyn CommandRunnable + 'a>>,
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Box<dyn CommandRunnable + 'a>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Option<&(dyn CommandRunnable + 'a)> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Every deployment command, wired to the given platform, operations and
/// scale-over engine.
pub fn standard_registry<'a>(
    platform: &'a dyn PlatformClient,
    ops: &'a dyn Operations,
    scaleover: &'a dyn Scaleover,
    config: &ZddConfig,
) -> Registry<'a> {
    let mut registry = Registry::new();
    registry.register(Box::new(CanaryDeploy::new(platform, ops)));
    registry.register(Box::new(CanaryPromote::new(platform, ops, scaleover)));
    registry.register(Box::new(
        BlueGreen::new(platform, ops).with_poll_interval(config.poll_interval()),
    ));
    registry.register(Box::new(
        ZddDeploy::new(ops, scaleover).with_default_duration(&config.defaults.zdd_duration),
    ));
    registry.register(Box::new(ScaleOverCommand::new(scaleover)));
    registry
}

pub fn execute(registry: &Registry<'_>, name: &str, args: &CommandArgs) -> anyhow::Result<DeployReport> {
    let command = registry
        .get(name)
        .with_context(|| format!("unknown command {name}"))?;
    info!(command = name, old_app = %args.old_app, new_app = %args.new_app, "running command");
    Ok(command.run(args)?)
}

pub fn render_report(report: &DeployReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(report.to_string()),
    }
}

/// Run deployment command `name` against the `cf` CLI.
pub fn run(name: &str, args: &ZddArgs) -> anyhow::Result<()> {
    let config = ZddConfig::load(args.config.as_deref()).context("failed to load tool config")?;
    let platform = CfCli::from_config(&config);
    let ops = CommonCommands::new(&platform);
    let engine = ScaleOver::new(&platform).with_quiet(args.format == OutputFormat::Json);
    let registry = standard_registry(&platform, &ops, &engine, &config);

    let report = execute(&registry, name, &args.to_command_args())?;
    println!("{}", render_report(&report, args.format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use zdd_core::LifecycleState;
    use zdd_core::fake::FakePlatform;
    use zdd_rollout::{BLUE_GREEN, CANARY_DEPLOY, CANARY_PROMOTE, RolloutError, SCALEOVER, ZDD_DEPLOY};

    fn quiet_engine(platform: &dyn PlatformClient) -> ScaleOver<'_> {
        ScaleOver::new(platform)
            .with_sleep_fn(Box::new(|_| {}))
            .with_interactive(false)
    }

    #[test]
    fn registry_holds_every_deployment_command() {
        let fake = FakePlatform::new();
        let ops = CommonCommands::new(&fake);
        let engine = quiet_engine(&fake);
        let registry = standard_registry(&fake, &ops, &engine, &ZddConfig::default());

        let mut expected = vec![CANARY_DEPLOY, CANARY_PROMOTE, BLUE_GREEN, ZDD_DEPLOY, SCALEOVER];
        expected.sort_unstable();
        assert_eq!(registry.names(), expected);
        assert!(registry.get("zdd-help").is_none());
    }

    #[test]
    fn unknown_command_is_an_error() {
        let registry = Registry::new();
        let err = execute(&registry, "deploy-rolling", &CommandArgs::default()).unwrap_err();
        assert!(err.to_string().contains("deploy-rolling"));
    }

    #[test]
    fn scaleover_through_the_registry() {
        let fake = FakePlatform::new()
            .with_app("old", LifecycleState::Started, 2, &[("www", "example.com")])
            .with_app("new", LifecycleState::Stopped, 0, &[("www", "example.com")]);
        let ops = CommonCommands::new(&fake);
        let engine = quiet_engine(&fake);
        let registry = standard_registry(&fake, &ops, &engine, &ZddConfig::default());

        let args = CommandArgs {
            old_app: "old".to_string(),
            new_app: "new".to_string(),
            duration: Some("1s".to_string()),
            ..Default::default()
        };
        let report = execute(&registry, SCALEOVER, &args).unwrap();
        assert!(report.is_success());
        assert_eq!(fake.app("new").unwrap().instance_count, 2);
        assert_eq!(fake.app("old").unwrap().state, LifecycleState::Stopped);
    }

    #[test]
    fn fatal_errors_surface_as_rollout_errors() {
        let fake = FakePlatform::new();
        let ops = CommonCommands::new(&fake);
        let engine = quiet_engine(&fake);
        let registry = standard_registry(&fake, &ops, &engine, &ZddConfig::default());

        let err = execute(&registry, ZDD_DEPLOY, &CommandArgs::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RolloutError>(),
            Some(RolloutError::Usage(_))
        ));
    }

    #[test]
    fn json_report_lists_steps() {
        let mut report = DeployReport::new(BLUE_GREEN);
        report.record("push shop", Ok::<(), String>(()));
        report.record("delete shop-venerable", Err::<(), _>("boom"));

        let json = render_report(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["command"], "blue-green");
        assert_eq!(value["steps"][0]["status"], "ok");
        assert_eq!(value["steps"][1]["status"], "failed");
        assert_eq!(value["steps"][1]["error"], "boom");

        let text = render_report(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("completed with 1 failed step(s)"));
    }

    #[test]
    fn config_default_duration_paces_deploy_zdd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zdd.toml");
        std::fs::write(&path, "[defaults]\nzdd_duration = \"90s\"\n").unwrap();
        let config = ZddConfig::load(Some(&path)).unwrap();
        assert_eq!(config.defaults.zdd_duration, "90s");
        assert_eq!(config.defaults.poll_interval, "20s");

        let fake = FakePlatform::new()
            .with_app("shop", LifecycleState::Started, 3, &[("shop", "example.com")])
            .with_manifest_routes(&[("shop", "example.com")]);
        let ops = CommonCommands::new(&fake);
        let sleeps = Rc::new(RefCell::new(Vec::new()));
        let recorded = sleeps.clone();
        let engine = ScaleOver::new(&fake)
            .with_sleep_fn(Box::new(move |d| recorded.borrow_mut().push(d)))
            .with_interactive(false)
            .with_quiet(true);
        let registry = standard_registry(&fake, &ops, &engine, &config);

        let args = CommandArgs {
            new_app: "shop".to_string(),
            ..Default::default()
        };
        let report = execute(&registry, ZDD_DEPLOY, &args).unwrap();
        assert!(report.is_success(), "{report}");
        // 90s over three instances.
        assert_eq!(*sleeps.borrow(), vec![Duration::from_secs(30); 2]);
        assert!(fake.app("shop-venerable").is_none());
    }
}
