//! Fixture file types
//!
//! Defines the data structures for deserializing `health_test.yaml` files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::health::HealthStatus;

/// Contents of one fixture file
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct TestStructure {
    /// Cases in declaration order
    #[serde(default)]
    pub tests: Vec<IndividualTest>,
}

/// A single fixture case
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndividualTest {
    /// Sample resource manifest, relative to the fixture directory
    pub input_path: String,
    /// Health status the script is expected to report for it
    #[serde(default)]
    pub health_status: HealthStatus,
}

impl TestStructure {
    /// Load and parse a fixture file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FixtureRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| Error::FixtureParse {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }
}

/// One case ready to run: the fixture directory plus its declaration
#[derive(Debug, Clone)]
pub struct TestCase {
    pub dir: PathBuf,
    pub test: IndividualTest,
}

impl TestCase {
    /// Case name, the declared input path
    pub fn name(&self) -> &str {
        &self.test.input_path
    }

    /// Input manifest path as handed to the assessment CLI
    pub fn input(&self) -> PathBuf {
        self.dir.join(&self.test.input_path)
    }

    /// Name qualified with the fixture directory
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.dir.display(), self.test.input_path)
    }
}
