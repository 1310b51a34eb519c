//! Fixture discovery
//!
//! Walks a directory tree looking for health scripts and loads the fixture
//! file next to each one. Discovery only collects descriptors; running them
//! is up to the runner.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::common::{Error, Result, Settings};

use super::config::{TestCase, TestStructure};

/// What to look for while walking
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Substring a file name must contain to count as a health script
    pub marker: String,
    /// Fixture file name expected in the script's directory
    pub fixture_file: String,
}

impl From<&Settings> for DiscoveryOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            marker: settings.marker.clone(),
            fixture_file: settings.fixture_file.clone(),
        }
    }
}

/// A directory holding a health script and its fixtures
#[derive(Debug)]
pub struct FixtureSet {
    pub dir: PathBuf,
    /// The marker file that caused this directory to be picked up
    pub script: PathBuf,
    /// Parsed fixture file, or why it could not be loaded
    pub fixture: Result<TestStructure>,
}

impl FixtureSet {
    /// Cases declared in this directory, in fixture order
    ///
    /// Empty when the fixture failed to load.
    pub fn cases(&self) -> Vec<TestCase> {
        match &self.fixture {
            Ok(structure) => structure
                .tests
                .iter()
                .map(|test| TestCase {
                    dir: self.dir.clone(),
                    test: test.clone(),
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Recursively scan `root` for health scripts
///
/// Entries are visited sorted by file name so the result is deterministic.
/// A directory with several matching files is reported once.
pub fn discover(root: &Path, options: &DiscoveryOptions) -> Result<Vec<FixtureSet>> {
    let mut seen = BTreeSet::new();
    let mut sets = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::Discovery {
                    root: root.display().to_string(),
                    error: e.to_string(),
                });
            }
            Err(e) => {
                if let Some(script) = e.path().filter(|p| is_marker(p, options)) {
                    let dir = script.parent().unwrap_or(root).to_path_buf();
                    if seen.insert(dir.clone()) {
                        tracing::warn!(
                            script = %script.display(),
                            error = %e,
                            "unreadable health script"
                        );
                        sets.push(FixtureSet {
                            dir,
                            script: script.to_path_buf(),
                            fixture: Err(Error::FixtureRead {
                                path: script.display().to_string(),
                                error: e.to_string(),
                            }),
                        });
                    }
                } else {
                    tracing::warn!(error = %e, "skipping unreadable path");
                }
                continue;
            }
        };
        if entry.file_type().is_dir() || !is_marker(entry.path(), options) {
            continue;
        }

        let script = entry.path().to_path_buf();
        let dir = script.parent().unwrap_or(root).to_path_buf();
        if !seen.insert(dir.clone()) {
            tracing::debug!(script = %script.display(), "directory already discovered");
            continue;
        }

        let fixture = TestStructure::load(&dir.join(&options.fixture_file));
        match &fixture {
            Ok(structure) => tracing::debug!(
                dir = %dir.display(),
                cases = structure.tests.len(),
                "discovered fixtures"
            ),
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "unusable fixture"),
        }

        sets.push(FixtureSet {
            dir,
            script,
            fixture,
        });
    }

    Ok(sets)
}

fn is_marker(path: &Path, options: &DiscoveryOptions) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().contains(options.marker.as_str()))
}
