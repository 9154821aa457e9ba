/// Application configuration management
/// Stores user preferences in ~/.config/server-check/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::constants::*;
use super::helpers::config_dir;
use crate::core::{PollMode, SessionOptions, SshSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pause between two polling sweeps
    pub refresh_interval_secs: u64,
    /// How long one dashboard frame stays up before the next redraw
    pub display_period_secs: u64,
    /// Quit-key polling granularity
    pub key_poll_millis: u64,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub poll_mode: PollMode,
    pub ssh: SshSettings,
    pub log_level: String,
    /// Defaults to `server-check.log` in the config directory
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            display_period_secs: DEFAULT_DISPLAY_PERIOD_SECS,
            key_poll_millis: DEFAULT_KEY_POLL_MILLIS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            poll_mode: PollMode::default(),
            ssh: SshSettings::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join(SETTINGS_FILE))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn display_period(&self) -> Duration {
        Duration::from_secs(self.display_period_secs.max(1))
    }

    pub fn key_poll(&self) -> Duration {
        Duration::from_millis(self.key_poll_millis.max(10))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            command_timeout: Duration::from_secs(self.command_timeout_secs.max(1)),
        }
    }

    /// Resolve the log file location
    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join(LOG_FILE)),
        }
    }
}
