//! health-check - test runner for Argo CD resource health scripts
//!
//! Discovers `health_test.yaml` fixtures, runs each case through the
//! kustomize, yq and argocd binaries, and checks the reported health status.

pub mod cli;
pub mod commands;
pub mod common;
pub mod health;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result, Settings};
pub use health::{HealthStatus, HealthStatusCode};
