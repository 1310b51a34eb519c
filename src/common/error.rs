//! Error types for the health-check runner
//!
//! Variants are grouped by where they surface: discovery errors fail the
//! whole run, fixture errors fail one directory, execution and assertion
//! errors fail one case.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the health-check runner
#[derive(Error, Debug)]
pub enum Error {
    // === Discovery Errors ===
    #[error("Failed to walk fixture tree '{root}': {error}")]
    Discovery { root: String, error: String },

    // === Fixture Errors ===
    #[error("Failed to read fixture file '{path}': {error}")]
    FixtureRead { path: String, error: String },

    #[error("Invalid fixture file '{path}': {error}")]
    FixtureParse { path: String, error: String },

    // === Execution Errors ===
    #[error("Failed to start '{program}': {error}")]
    StageSpawn { program: String, error: String },

    #[error("'{program}' exited with {status}: {stderr}")]
    StageFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Pipeline has no stages")]
    EmptyPipeline,

    // === Assertion Errors ===
    #[error("Health status mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("{failed} of {total} health checks failed")]
    TestsFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a spawn failure for a pipeline stage
    pub fn stage_spawn(program: &str, error: &io::Error) -> Self {
        Self::StageSpawn {
            program: program.to_string(),
            error: error.to_string(),
        }
    }

    /// Create an exit failure for a pipeline stage
    pub fn stage_failed(program: &str, status: &str, stderr: &str) -> Self {
        Self::StageFailed {
            program: program.to_string(),
            status: status.to_string(),
            stderr: stderr.trim_end().to_string(),
        }
    }
}
