use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::deploy::ZddArgs;
use zdd_rollout::{BLUE_GREEN, CANARY_DEPLOY, CANARY_PROMOTE, SCALEOVER, ZDD_DEPLOY};

mod commands;

const DEFAULT_LOG_FILTER: &str = "cf_zdd=info,zdd_rollout=info,zdd_core=info";

#[derive(Parser)]
#[command(
    name = "cf-zdd",
    about = "Zero-downtime deployments for Cloud Foundry applications",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploys an application with a canary route
    DeployCanary(ZddArgs),
    /// Performs a promotion on the canary
    PromoteCanary(ZddArgs),
    /// Deploys an application and then flips the route to the new application
    BlueGreen(ZddArgs),
    /// ZDD deployment using scale-over
    DeployZdd(ZddArgs),
    /// Scales over one application version to another
    Scaleover(ZddArgs),
    /// Usage of a deployment command, or the list of deployment types
    ZddHelp {
        /// Command to describe
        topic: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    let (name, args) = match cli.command {
        Commands::ZddHelp { topic } => {
            println!("{}", commands::help::help_text(topic.as_deref()));
            return Ok(());
        }
        Commands::DeployCanary(args) => (CANARY_DEPLOY, args),
        Commands::PromoteCanary(args) => (CANARY_PROMOTE, args),
        Commands::BlueGreen(args) => (BLUE_GREEN, args),
        Commands::DeployZdd(args) => (ZDD_DEPLOY, args),
        Commands::Scaleover(args) => (SCALEOVER, args),
    };

    commands::deploy::run(name, &args)
}
