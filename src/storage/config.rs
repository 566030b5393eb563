//! Configuration handling for favorites
//!
//! Configuration is stored in `config.toml` inside the platform config
//! directory (for example `~/.config/favs/config.toml`). Every setting has
//! a default, so a missing file is not an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CasePolicy;

/// Preference key holding the favorites list
pub const DEFAULT_PREFERENCE_KEY: &str = "entries";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Could not determine a data directory; set storage.dir")]
    NoDataDir,
}

/// Where the favorites list is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for preference files (defaults to the platform data dir)
    pub dir: Option<PathBuf>,

    /// Preference key of the favorites list
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: DEFAULT_PREFERENCE_KEY.to_string(),
        }
    }
}

/// Path comparison settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Force case-insensitive keys; detected from the filesystem when unset
    pub case_insensitive: Option<bool>,
}

impl PathsConfig {
    pub fn case_policy(&self) -> Option<CasePolicy> {
        self.case_insensitive.map(CasePolicy::from_insensitive)
    }
}

/// The managed workspace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root; paths inside it become workspace members
    pub root: Option<PathBuf>,
}

/// Filesystem watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How long to gather events into one delta, in milliseconds
    pub batch_millis: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { batch_millis: 250 }
    }
}

impl WatchConfig {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_millis)
    }
}

/// Combined configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub paths: PathsConfig,
    pub workspace: WorkspaceConfig,
    pub watch: WatchConfig,
}

impl Config {
    /// Loads configuration from an explicit file, or the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::global_config_dir() {
                Some(dir) => {
                    let path = dir.join("config.toml");
                    if path.exists() {
                        Self::from_file(&path)
                    } else {
                        Ok(Self::default())
                    }
                }
                None => Ok(Self::default()),
            },
        }
    }

    /// Reads and parses one config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .map_err(Into::into)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "favs", "favs")
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the directory holding persisted preferences
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.dir {
            return Ok(dir.clone());
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| ConfigError::NoDataDir.into())
    }

    /// Serializes the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
