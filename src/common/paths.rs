//! Configuration file locations

use std::path::{Component, Path, PathBuf};

/// Name used for the project directories and the local config file
const APP_NAME: &str = "health-check";

/// Config file looked up in the working directory before the platform location
pub const LOCAL_CONFIG_FILE: &str = "health-check.toml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/health-check/`
/// - macOS: `~/Library/Application Support/health-check/`
/// - Windows: `%APPDATA%\health-check\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the platform configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Join `path` onto `base` unless it is already absolute
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Whether a configured program is a bare name to be looked up on PATH
pub fn is_bare_program(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
