//! Configuration management for Echidna.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Every protocol constant of the search
//! API (page size, page ceiling, confirmation threshold) lives here rather
//! than in the code that uses it.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest page size the search endpoint accepts.
const MAX_PER_PAGE: u32 = 100;

/// Main application configuration.
///
/// Loaded from an explicit path, or `~/.config/echidna/config.toml`
/// (or platform equivalent). Missing files and sections fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP API settings
    pub api: ApiConfig,
    /// Pagination and ceiling settings
    pub search: SearchConfig,
    /// Throttle recovery settings
    pub throttle: ThrottleConfig,
}

impl AppConfig {
    /// Load configuration from `path` if given, otherwise from the XDG
    /// config directory, falling back to defaults if no file exists there.
    ///
    /// An explicitly supplied path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.display().to_string(),
                    });
                }
                path.to_path_buf()
            }
            None => Self::config_path()?,
        };

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides, then validate.
    ///
    /// Supports the following environment variables:
    /// - `ECHIDNA_API_URL`: Override the API base URL
    /// - `ECHIDNA_BACKOFF_SECS`: Override the credential-unavailable backoff
    /// - `ECHIDNA_MONITOR_INTERVAL_SECS`: Override the throttle poll interval
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup function.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ECHIDNA_API_URL") {
            tracing::debug!("Override api.base_url from env: {}", url);
            self.api.base_url = url;
        }

        if let Some(secs) = lookup("ECHIDNA_BACKOFF_SECS").and_then(|v| v.parse().ok()) {
            tracing::debug!("Override throttle.backoff_secs from env: {}", secs);
            self.throttle.backoff_secs = secs;
        }

        if let Some(secs) = lookup("ECHIDNA_MONITOR_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            tracing::debug!("Override throttle.monitor_interval_secs from env: {}", secs);
            self.throttle.monitor_interval_secs = secs;
        }
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.per_page == 0 || self.search.per_page > MAX_PER_PAGE {
            return Err(invalid(
                "search.per_page",
                format!("must be between 1 and {MAX_PER_PAGE}"),
            ));
        }
        if self.search.max_pages == 0 {
            return Err(invalid("search.max_pages", "must be at least 1"));
        }
        if self.throttle.backoff_secs == 0 {
            return Err(invalid("throttle.backoff_secs", "must be at least 1"));
        }
        if self.throttle.monitor_interval_secs == 0 {
            return Err(invalid("throttle.monitor_interval_secs", "must be at least 1"));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url", "must not be empty"));
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/echidna/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "echidna", "echidna").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string (the API rejects requests without one)
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            timeout_secs: 30,
            user_agent: concat!("echidna/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Pagination settings of the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results per page
    pub per_page: u32,
    /// Deepest page reachable in one sort direction
    pub max_pages: u32,
    /// Totals above this ask for confirmation before paging on
    pub confirm_threshold: u64,
    /// Sort key passed to the endpoint
    pub sort: String,
}

impl SearchConfig {
    /// Results reachable in a single sweep (`per_page * max_pages`).
    #[must_use]
    pub fn ceiling(&self) -> u64 {
        u64::from(self.per_page) * u64::from(self.max_pages)
    }

    /// Results reachable with both sweeps combined.
    #[must_use]
    pub fn reachable(&self) -> u64 {
        self.ceiling() * 2
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_pages: 10,
            confirm_threshold: 100,
            sort: "indexed".to_string(),
        }
    }
}

/// Throttle recovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Seconds between quota polls of throttled credentials
    pub monitor_interval_secs: u64,
    /// Seconds to wait when no credential is available
    pub backoff_secs: u64,
}

impl ThrottleConfig {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Backoff as a `Duration`.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            monitor_interval_secs: 10,
            backoff_secs: 10,
        }
    }
}
