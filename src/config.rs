//! Configuration file handling (`~/.crm_assistant/config.json`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration, stored as JSON in `~/.crm_assistant/config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,
    /// Base URL of the CRM backend (serves `POST /chat` and `GET /`)
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Overrides the default log directory
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            backend_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            log_dir: None,
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".crm_assistant"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location or return default
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                debug!("Failed to load config, using default: {}", e);
                Self::default()
            }
        }
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from file, or default when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Log directory, either configured or `~/.crm_assistant/logs`
    pub fn log_dir(&self) -> Result<PathBuf> {
        match self.log_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("logs")),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.backend_url.trim_end_matches('/'))
    }

    pub fn health_url(&self) -> String {
        format!("{}/", self.backend_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
