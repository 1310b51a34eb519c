//! health-check - fixture-driven tests for Argo CD resource health scripts
//!
//! Runs every `health_test.yaml` case through kustomize, yq and
//! `argocd admin settings resource-overrides health`.

use clap::Parser;
use health_check::{cli, commands::Commands, common::logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "health-check", about = "Test Argo CD resource health scripts")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: ./health-check.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show commands and tool output for every case
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    if let Err(e) = cli::dispatch(cli.command, cli.config.as_deref(), cli.verbose).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
