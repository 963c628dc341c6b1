//! TOML-based engine configuration.
//!
//! Currently holds the week-unit convention used by quota streaks and
//! monthly metrics. Stored at `~/.config/habitkit/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::recurrence::WeekStart;

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/habitkit/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// First day of the week unit (Sunday by default). Applied consistently
    /// to quota satisfaction, quota streaks, and week-unit counting.
    #[serde(default)]
    pub week_start: WeekStart,
}

impl Config {
    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist the configuration.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved or the
    /// file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
        path: PathBuf::from("~/.config/habitkit"),
        message: e.to_string(),
    })?;
    Ok(dir.join("config.toml"))
}
