//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{self, config_path, LOCAL_CONFIG_FILE};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Project root; relative paths below are resolved against it
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Directory tree scanned for health scripts
    #[serde(default = "default_fixtures_root")]
    pub fixtures_root: PathBuf,

    /// Kustomization rendered to obtain the argocd-cm ConfigMap
    #[serde(default = "default_manifest_source")]
    pub manifest_source: PathBuf,

    /// Substring identifying a health script file
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Fixture file expected next to each health script
    #[serde(default = "default_fixture_file")]
    pub fixture_file: String,

    /// External tool locations
    #[serde(default)]
    pub binaries: Binaries,

    /// Object selected out of the rendered manifests
    #[serde(default)]
    pub config_map: ConfigMapSelector,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            fixtures_root: default_fixtures_root(),
            manifest_source: default_manifest_source(),
            marker: default_marker(),
            fixture_file: default_fixture_file(),
            binaries: Binaries::default(),
            config_map: ConfigMapSelector::default(),
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_fixtures_root() -> PathBuf {
    PathBuf::from("argocd/argocd-install/resource-customizations")
}
fn default_manifest_source() -> PathBuf {
    PathBuf::from("argocd/argocd-install")
}
fn default_marker() -> String {
    "health.lua".to_string()
}
fn default_fixture_file() -> String {
    "health_test.yaml".to_string()
}

/// Paths to the three external tools, relative to the project root
#[derive(Debug, Deserialize, Clone)]
pub struct Binaries {
    #[serde(default = "default_kustomize")]
    pub kustomize: PathBuf,

    #[serde(default = "default_yq")]
    pub yq: PathBuf,

    #[serde(default = "default_argocd")]
    pub argocd: PathBuf,
}

impl Default for Binaries {
    fn default() -> Self {
        Self {
            kustomize: default_kustomize(),
            yq: default_yq(),
            argocd: default_argocd(),
        }
    }
}

fn default_kustomize() -> PathBuf {
    PathBuf::from("bin/kustomize")
}
fn default_yq() -> PathBuf {
    PathBuf::from("bin/yq")
}
fn default_argocd() -> PathBuf {
    PathBuf::from("bin/argocd")
}

/// Kind and name of the object the yq stage filters for
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConfigMapSelector {
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for ConfigMapSelector {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            name: default_name(),
        }
    }
}

fn default_kind() -> String {
    "ConfigMap".to_string()
}
fn default_name() -> String {
    "argocd-cm".to_string()
}

impl ConfigMapSelector {
    /// yq expression selecting this object
    pub fn yq_expression(&self) -> String {
        format!(
            r#"select(.kind == "{}" and .metadata.name == "{}")"#,
            self.kind, self.name
        )
    }
}

/// Configuration with every path resolved, ready for discovery and execution
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_root: PathBuf,
    pub fixtures_root: PathBuf,
    pub manifest_source: PathBuf,
    pub marker: String,
    pub fixture_file: String,
    pub kustomize: PathBuf,
    pub yq: PathBuf,
    pub argocd: PathBuf,
    pub config_map: ConfigMapSelector,
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise `./health-check.toml` is tried,
    /// then the platform config file, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_file(local);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve paths against the project root
    ///
    /// Binaries given as bare names are looked up on PATH.
    pub fn settings(&self) -> Settings {
        let root = &self.project_root;
        Settings {
            project_root: root.clone(),
            fixtures_root: paths::resolve(root, &self.fixtures_root),
            manifest_source: paths::resolve(root, &self.manifest_source),
            marker: self.marker.clone(),
            fixture_file: self.fixture_file.clone(),
            kustomize: resolve_binary(root, &self.binaries.kustomize),
            yq: resolve_binary(root, &self.binaries.yq),
            argocd: resolve_binary(root, &self.binaries.argocd),
            config_map: self.config_map.clone(),
        }
    }
}

fn resolve_binary(root: &Path, program: &Path) -> PathBuf {
    if paths::is_bare_program(program) {
        return which::which(program).unwrap_or_else(|_| program.to_path_buf());
    }
    paths::resolve(root, program)
}
