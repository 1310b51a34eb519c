//! Common utilities shared by the runner and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::{Config, Settings};
pub use error::{Error, Result};
