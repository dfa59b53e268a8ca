use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::commands::Commands;
use super::output::OutputFormat;
use super::runtime::{init_logging, load_config};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;
    info!(
        "Starting PagePilot v{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_DATE")
    );

    let config = load_config(cli.config.as_ref())?;

    let outcome = match cli.command.clone() {
        Commands::Run(args) => super::run::cmd_run(args, config, &cli.output).await,
        Commands::Demo(args) => super::demo::cmd_demo(args, config, &cli.output).await,
        Commands::Schema(args) => super::schema::cmd_schema(args),
    };

    match outcome {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {err:#}");
            Err(err)
        }
    }
}
