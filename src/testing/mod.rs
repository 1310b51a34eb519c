//! Health script test runner
//!
//! Reads `health_test.yaml` fixtures found next to `health.lua` scripts,
//! runs each case through `kustomize | yq | argocd` and compares the
//! reported status with the fixture. Discovery and execution are separate
//! phases so either can be used on its own.

mod config;
mod discovery;
mod output;
mod pipeline;
mod runner;

pub use config::*;
pub use discovery::{discover, DiscoveryOptions, FixtureSet};
pub use output::{OutputLine, ParsedOutput};
pub use pipeline::{Pipeline, PipelineOutput, Stage, StageOutput};
pub use runner::{compare, run_all, run_case, CaseOutcome, RunOptions, RunSummary};
