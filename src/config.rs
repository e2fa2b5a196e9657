//! User preferences loaded from `config.toml`.

use crate::episode_download::DEFAULT_EPISODE_LIMIT;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the episodes API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// How many episodes to request
    #[serde(default = "default_episode_limit")]
    pub episode_limit: usize,

    /// Where log output goes while the TUI owns the terminal
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_api_url() -> String {
    "http://localhost:3333".to_string()
}

fn default_episode_limit() -> usize {
    DEFAULT_EPISODE_LIMIT
}

fn default_log_file() -> PathBuf {
    PathBuf::from("podcastr.log")
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: default_api_url(),
            episode_limit: default_episode_limit(),
            log_file: default_log_file(),
        }
    }

    /// `~/.config/podcastr/config.toml` on Linux, the platform equivalent elsewhere.
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?.join("podcastr");
        Ok(config_dir.join("config.toml"))
    }

    /// Loads the default config file, falling back to defaults when it doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
