//! CLI command handling
//!
//! Dispatches CLI commands to the runner and formats output.

use std::path::Path;

use colored::Colorize;
use tokio::io::AsyncReadExt;

use crate::commands::{Commands, TreeArgs};
use crate::common::{Config, Result, Settings};
use crate::testing::{self, DiscoveryOptions, FixtureSet, ParsedOutput, Pipeline, RunOptions};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_path: Option<&Path>, verbose: bool) -> Result<()> {
    match command {
        Commands::Run { tree, filter, json } => {
            let settings = load_settings(config_path, &tree)?;
            let options = RunOptions {
                filter,
                verbose,
                quiet: json,
            };

            let summary = testing::run_all(&settings, &options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            summary.check()
        }

        Commands::List { tree, commands } => {
            let settings = load_settings(config_path, &tree)?;
            let options = DiscoveryOptions::from(&settings);
            let sets = testing::discover(&settings.fixtures_root, &options)?;
            print_listing(&settings, &sets, commands);
            Ok(())
        }

        Commands::Parse => {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;

            let parsed = ParsedOutput::from_stdout(&input);
            for line in &parsed.unrecognized {
                tracing::info!("{}", line);
            }
            println!("{}", serde_json::to_string_pretty(&parsed.status)?);
            Ok(())
        }
    }
}

fn load_settings(config_path: Option<&Path>, tree: &TreeArgs) -> Result<Settings> {
    let mut config = Config::load(config_path)?;
    if let Some(project_root) = &tree.project_root {
        config.project_root = project_root.clone();
    }

    let mut settings = config.settings();
    // --root is taken as given, relative to the working directory
    if let Some(root) = &tree.root {
        settings.fixtures_root = root.clone();
    }
    Ok(settings)
}

fn print_listing(settings: &Settings, sets: &[FixtureSet], commands: bool) {
    let mut total = 0;
    for set in sets {
        println!("{}", set.dir.display().to_string().white().bold());
        if let Err(e) = &set.fixture {
            println!("  {} {}", "✗".red(), e);
            continue;
        }
        for case in set.cases() {
            total += 1;
            let expected = &case.test.health_status;
            println!("  {} {}", case.name(), expected.to_string().dimmed());
            if commands {
                let pipeline = Pipeline::health_check(settings, &case.input());
                println!("    $ {}", pipeline.to_string().dimmed());
            }
        }
    }
    println!("\n{} cases in {} directories", total, sets.len());
}
