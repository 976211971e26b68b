//! Application configuration module
//!
//! Provides the configuration shared by the server and the inspection CLI.
//! Values come from, in increasing priority:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (default `<config dir>/xfcollab/config.toml`)
//! 3. Environment variables `DATABASE_URL`, `RUST_LOG`, `XFCOLLAB_MAX_CONNECTIONS`
//!
//! # Example
//!
//! ```rust
//! use xfcollab::shared::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .database_url("sqlite::memory:")
//!     .max_connections(1)
//!     .build()
//!     .unwrap();
//! assert!(config.is_in_memory());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://xfcollab.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BROADCAST_CAPACITY: usize = 100;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
const DEFAULT_LOG_FILTER: &str = "xfcollab=info";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Buffered events per broadcast channel
    pub broadcast_capacity: usize,
    /// Seconds between sweeps of broadcast channels without subscribers
    pub cleanup_interval_secs: u64,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("xfcollab").join("config.toml"))
    }

    /// Load configuration from a file and the environment
    ///
    /// With `path` set, the file must exist. Without it, the default
    /// location is read when present and skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            self.log_filter = filter;
        }
        if let Ok(value) = std::env::var("XFCOLLAB_MAX_CONNECTIONS") {
            self.max_connections = value.parse().map_err(|_| ConfigError::InvalidValue {
                field: "max_connections",
                message: format!("{:?} is not a number", value),
            })?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingValue("database_url"));
        }
        if !self.database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidValue {
                field: "database_url",
                message: format!("{} is not a sqlite URL", self.database_url),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_connections",
                message: "must be at least 1".to_string(),
            });
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broadcast_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cleanup_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the database lives only in this process
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    database_url: Option<String>,
    max_connections: Option<u32>,
    broadcast_capacity: Option<usize>,
    cleanup_interval_secs: Option<u64>,
    log_filter: Option<String>,
}

impl AppConfigBuilder {
    /// Set the database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = Some(capacity);
        self
    }

    pub fn cleanup_interval_secs(mut self, secs: u64) -> Self {
        self.cleanup_interval_secs = Some(secs);
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            database_url: self.database_url.unwrap_or(defaults.database_url),
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            broadcast_capacity: self.broadcast_capacity.unwrap_or(defaults.broadcast_capacity),
            cleanup_interval_secs: self.cleanup_interval_secs.unwrap_or(defaults.cleanup_interval_secs),
            log_filter: self.log_filter.unwrap_or(defaults.log_filter),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
