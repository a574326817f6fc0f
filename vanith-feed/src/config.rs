//! Configuration management
//!
//! Handles:
//! - Backend endpoint and request headers
//! - Polling period and request timeout
//! - Console display preferences
//! - TOML storage in the OS config directory, with env overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Env var pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "VANITH_FEED_CONFIG";
pub const API_URL_ENV: &str = "VANITH_API_URL";
pub const POLL_INTERVAL_ENV: &str = "VANITH_POLL_INTERVAL_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub user_agent: String,
    /// Send `ngrok-skip-browser-warning` so tunnels skip their interstitial page
    pub skip_browser_warning: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_activities: usize,
    pub search: Option<String>,
    /// Paint author names in their role colour (ANSI truecolor)
    pub color: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/all".to_string(),
            user_agent: "VanithWebsite/1.0".to_string(),
            skip_browser_warning: true,
            timeout_secs: 10,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_activities: 20,
            search: None,
            color: false,
        }
    }
}

impl FeedConfig {
    /// Load from `explicit`, else the default location, else defaults.
    /// Env overrides and validation are applied on top.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path).await?,
            None => {
                let path = Self::config_file_path()?;
                if path.exists() {
                    Self::load_from(&path).await?
                } else {
                    info!("No config at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: FeedConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// `$VANITH_FEED_CONFIG`, else `<config dir>/vanith-feed/config.toml`
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("vanith-feed");
        path.push("config.toml");
        Ok(path)
    }

    /// Apply overrides from a key lookup (the process env in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api.url = url;
        }

        if let Some(secs) = lookup(POLL_INTERVAL_ENV) {
            self.polling.interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", POLL_INTERVAL_ENV))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.url.trim().is_empty() {
            anyhow::bail!("api.url must not be empty");
        }
        if self.polling.interval_secs == 0 {
            anyhow::bail!("polling.interval_secs must be positive");
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be positive");
        }
        if self.api.timeout_secs >= self.polling.interval_secs {
            warn!(
                "Request timeout ({}s) is not shorter than the poll interval ({}s)",
                self.api.timeout_secs, self.polling.interval_secs
            );
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
