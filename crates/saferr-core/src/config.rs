//! Application configuration management.
//!
//! Configuration holds the last used username plus optional overrides for the
//! API base URL and request timeout. It is stored at
//! `~/.config/saferr/config.json`.
//!
//! The API base URL is resolved from `SAFERR_API_BASE_URL`, then the config
//! file, then the local development default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "saferr";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable supplying the API base URL
pub const API_BASE_URL_ENV: &str = "SAFERR_API_BASE_URL";

/// Base URL used when nothing else is configured (local backend)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_username: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session and log files
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve the API base URL from the environment, this config, or the default
    pub fn api_base_url(&self) -> String {
        Self::resolve_base_url(
            std::env::var(API_BASE_URL_ENV).ok(),
            self.api_base_url.as_deref(),
        )
    }

    fn resolve_base_url(env_value: Option<String>, configured: Option<&str>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                configured
                    .filter(|v| !v.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_defaults_to_local_backend() {
        assert_eq!(Config::resolve_base_url(None, None), DEFAULT_API_BASE_URL);
        assert_eq!(
            Config::resolve_base_url(Some("  ".to_string()), None),
            DEFAULT_API_BASE_URL
        );
    }

    #[test]
    fn test_env_overrides_config_file() {
        let url = Config::resolve_base_url(
            Some("https://api.saferr.example/api".to_string()),
            Some("https://staging.saferr.example/api"),
        );
        assert_eq!(url, "https://api.saferr.example/api");

        let url = Config::resolve_base_url(None, Some("https://staging.saferr.example/api"));
        assert_eq!(url, "https://staging.saferr.example/api");
    }

    #[test]
    fn test_request_timeout_ignores_zero() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.request_timeout().as_secs(), DEFAULT_REQUEST_TIMEOUT_SECS);

        let config = Config {
            request_timeout_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(config.request_timeout().as_secs(), 30);
    }
}
