//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::LOCAL_DEV_ORIGIN;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Explicit API base address; takes priority over origin detection
    #[serde(default)]
    pub base_url: Option<String>,

    /// Origin the dashboard is served from
    #[serde(default)]
    pub page_origin: Option<String>,

    /// Backend used when the page origin is a loopback host
    #[serde(default = "default_local_dev_origin")]
    pub local_dev_origin: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_local_dev_origin() -> String {
    LOCAL_DEV_ORIGIN.to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            page_origin: None,
            local_dev_origin: default_local_dev_origin(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Refresh interval of every view, in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_hashtags_ms")]
    pub hashtags_ms: u64,

    #[serde(default = "default_stats_ms")]
    pub stats_ms: u64,

    #[serde(default = "default_chart_ms")]
    pub line_ms: u64,

    #[serde(default = "default_chart_ms")]
    pub bar_ms: u64,

    #[serde(default = "default_chart_ms")]
    pub posts_ms: u64,
}

fn default_hashtags_ms() -> u64 {
    5000
}

fn default_stats_ms() -> u64 {
    4000
}

fn default_chart_ms() -> u64 {
    2000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            hashtags_ms: default_hashtags_ms(),
            stats_ms: default_stats_ms(),
            line_ms: default_chart_ms(),
            bar_ms: default_chart_ms(),
            posts_ms: default_chart_ms(),
        }
    }
}

impl PollingConfig {
    pub fn hashtags(&self) -> Duration {
        Duration::from_millis(self.hashtags_ms)
    }

    pub fn stats(&self) -> Duration {
        Duration::from_millis(self.stats_ms)
    }

    pub fn line(&self) -> Duration {
        Duration::from_millis(self.line_ms)
    }

    pub fn bar(&self) -> Duration {
        Duration::from_millis(self.bar_ms)
    }

    pub fn posts(&self) -> Duration {
        Duration::from_millis(self.posts_ms)
    }
}

/// Look-back window and row limits
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_minutes")]
    pub minutes: u32,

    /// Rows requested by the posts table
    #[serde(default = "default_posts_limit")]
    pub posts_limit: usize,

    /// Rows requested alongside the stat tiles
    #[serde(default = "default_stats_posts_limit")]
    pub stats_posts_limit: usize,
}

fn default_minutes() -> u32 {
    5
}

fn default_posts_limit() -> usize {
    50
}

fn default_stats_posts_limit() -> usize {
    200
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            minutes: default_minutes(),
            posts_limit: default_posts_limit(),
            stats_posts_limit: default_stats_posts_limit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("sentiscope").join("config.toml")),
            Some(PathBuf::from("./sentiscope.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(base) = lookup("SENTISCOPE_API_BASE") {
            self.api.base_url = Some(base);
        }
        if let Some(origin) = lookup("SENTISCOPE_PAGE_ORIGIN") {
            self.api.page_origin = Some(origin);
        }
        if let Some(timeout) = lookup("SENTISCOPE_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.api.request_timeout_ms = ms;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("SENTISCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SENTISCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Sentiscope Configuration
#
# Environment variables override these settings:
# - SENTISCOPE_API_BASE
# - SENTISCOPE_PAGE_ORIGIN
# - SENTISCOPE_REQUEST_TIMEOUT_MS
# - SENTISCOPE_LOG_LEVEL
# - SENTISCOPE_LOG_FORMAT

[api]
# Explicit backend address. Takes priority over origin detection.
# base_url = "http://127.0.0.1:8000"

# Origin the dashboard is served from. A localhost/127.0.0.1 origin
# talks to local_dev_origin; any other origin is used as the base.
# page_origin = "http://localhost:3000"

local_dev_origin = "http://127.0.0.1:8000"

# Request timeout; a timed out request falls back to simulated data
request_timeout_ms = 10000

[polling]
# Refresh intervals (ms)
hashtags_ms = 5000
stats_ms = 4000
line_ms = 2000
bar_ms = 2000
posts_ms = 2000

[window]
# Look-back window for counts and rolling sentiment (minutes)
minutes = 5

# Rows requested by the posts table
posts_limit = 50

# Rows requested alongside the stat tiles
stats_posts_limit = 200

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
