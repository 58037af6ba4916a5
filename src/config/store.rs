//! Config file loading and saving

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".kclone_config.json";
const DEFAULT_CLONE_DIR_NAME: &str = "gitworks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root under which `host/owner/repo` trees are created
    pub default_clone_dir: PathBuf,
}

impl Config {
    pub fn with_home_default(home: &Path) -> Self {
        Self { default_clone_dir: home.join(DEFAULT_CLONE_DIR_NAME) }
    }
}

/// Reads and writes the config document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    home: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf, home: PathBuf) -> Self {
        Self { path, home }
    }

    /// Store rooted at `<home>/.kclone_config.json`.
    pub fn for_home(home: &Path) -> Self {
        Self::new(home.join(CONFIG_FILE_NAME), home.to_path_buf())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Load the config, falling back to `<home>/gitworks` when no file exists.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            tracing::debug!("No config at {}, using defaults", self.path.display());
            return Ok(Config::with_home_default(&self.home));
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|source| ConfigError::Read { path: self.path.clone(), source })?;

        serde_json::from_str(&content)
            .map_err(|source| ConfigError::Malformed { path: self.path.clone(), source })
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = serde_json::to_string_pretty(config)
            .map_err(|source| ConfigError::Malformed { path: self.path.clone(), source })?;
        fs::write(&self.path, json).map_err(write_err)?;

        tracing::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

/// Resolve the per-user home directory.
///
/// `USERPROFILE` wins when set and non-empty, otherwise the platform home.
pub fn resolve_home() -> Result<PathBuf, ConfigError> {
    match std::env::var_os("USERPROFILE") {
        Some(profile) if !profile.is_empty() => Ok(PathBuf::from(profile)),
        _ => dirs::home_dir().ok_or(ConfigError::NoHome),
    }
}

/// Expand a leading `~` against `home` and make the result absolute.
pub fn expand_user(path: &str, home: &Path) -> std::io::Result<PathBuf> {
    let expanded = if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        home.join(rest)
    } else {
        PathBuf::from(path)
    };

    std::path::absolute(expanded)
}
