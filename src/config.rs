//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides; the
//! binary applies command-line flags on top.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::hub::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener and upgrade configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Origins allowed to open a connection; empty accepts any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Hub behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Per-write timeout in milliseconds; unset waits indefinitely
    #[serde(default)]
    pub write_timeout_ms: Option<u64>,

    /// Send the readiness marker to every new connection
    #[serde(default = "default_readiness_marker")]
    pub readiness_marker: bool,
}

fn default_readiness_marker() -> bool {
    true
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            write_timeout_ms: None,
            readiness_marker: default_readiness_marker(),
        }
    }
}

impl HubSettings {
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            write_timeout: self.write_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development
    #[default]
    Pretty,
    /// One JSON object per line, for production
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
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

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
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
    ///
    /// Nothing is logged here since this runs before logging is set up;
    /// call [`DefaultLoad::log`] once a subscriber exists.
    pub fn load_default() -> DefaultLoad {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("relay").join("config.toml")),
            Some(PathBuf::from("/etc/relay/config.toml")),
            Some(PathBuf::from("./relay.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths, |key| std::env::var(key).ok())
    }

    fn load_first(paths: &[PathBuf], var: impl Fn(&str) -> Option<String>) -> DefaultLoad {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(mut config) => {
                    config.apply_overrides(&var);
                    return DefaultLoad {
                        config,
                        source: Some(path.clone()),
                        skipped,
                    };
                }
                Err(e) => skipped.push(e),
            }
        }

        let mut config = Config::default();
        config.apply_overrides(&var);
        DefaultLoad {
            config,
            source: None,
            skipped,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("RELAY_ADDR") {
            self.server.addr = addr;
        }
        if let Some(origins) = var("RELAY_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(timeout) = var("RELAY_WRITE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.hub.write_timeout_ms = Some(ms);
            }
        }

        if let Some(level) = var("RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("RELAY_LOG_FORMAT") {
            if let Ok(format) = format.parse() {
                self.logging.format = format;
            }
        }
    }
}

/// Result of searching the default config locations
#[derive(Debug)]
pub struct DefaultLoad {
    pub config: Config,
    /// File the config was read from, `None` when built from defaults
    pub source: Option<PathBuf>,
    /// Files that exist but could not be loaded, in search order
    pub skipped: Vec<ConfigError>,
}

impl DefaultLoad {
    /// Report where the config came from and which files were skipped
    pub fn log(&self) {
        for e in &self.skipped {
            tracing::warn!("{}", e);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
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
    r#"# Relay Configuration
#
# Environment variables override these settings:
# - RELAY_ADDR
# - RELAY_ALLOWED_ORIGINS (comma-separated)
# - RELAY_WRITE_TIMEOUT_MS
# - RELAY_LOG_LEVEL
# - RELAY_LOG_FORMAT

[server]
# Address to listen on (host:port)
addr = "0.0.0.0:8080"

# Origins allowed to connect; leave empty to accept any origin
allowed_origins = []

[hub]
# Give up on a write to one connection after this many milliseconds
# write_timeout_ms = 5000

# Send a single 0x00 byte to every new connection
readiness_marker = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
