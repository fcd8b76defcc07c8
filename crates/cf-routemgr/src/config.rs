//! Configuration file support for cf-routemgr
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/cf-routemgr/routemgr.toml

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RouteMgrError, RouteMgrResult};
use crate::target::DEFAULT_APP_PORT;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cf-routemgr/routemgr.toml";

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Include thread ids in log lines
    #[serde(default)]
    pub thread_ids: bool,
}

/// Target defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Application port for targets that do not name one
    #[serde(default = "default_app_port")]
    pub default_app_port: u16,
}

/// Complete cf-routemgr configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMgrConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub targets: TargetConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_app_port() -> u16 {
    DEFAULT_APP_PORT
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            thread_ids: false,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            default_app_port: default_app_port(),
        }
    }
}

impl RouteMgrConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> RouteMgrResult<Self> {
        toml::from_str(content)
            .map_err(|e| RouteMgrError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> RouteMgrResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                RouteMgrError::config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Logging is not up yet
                eprintln!(
                    "cf-routemgr: Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(RouteMgrError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> RouteMgrResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> RouteMgrResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RouteMgrError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> RouteMgrResult<()> {
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(RouteMgrError::config(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        if self.targets.default_app_port == 0 {
            return Err(RouteMgrError::config("targets.default_app_port must be > 0"));
        }

        Ok(())
    }
}
