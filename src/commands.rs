//! CLI command definitions
//!
//! Defines the clap commands for the health-check CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every health script fixture under the fixtures root
    Run {
        #[command(flatten)]
        tree: TreeArgs,

        /// Only run cases whose name or directory contains this string
        #[arg(long, short)]
        filter: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List discovered fixture cases without running them
    List {
        #[command(flatten)]
        tree: TreeArgs,

        /// Also print the pipeline each case would run
        #[arg(long)]
        commands: bool,
    },

    /// Parse health CLI output from stdin and print the result as JSON
    Parse,
}

/// Overrides for where fixtures and tools are found
#[derive(Args, Debug, Default)]
pub struct TreeArgs {
    /// Directory scanned for health scripts, relative to the current directory
    /// (unlike the config file's fixtures_root, which is relative to the project root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Project root that tool and manifest paths are relative to
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}
