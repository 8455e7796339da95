//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/footfall/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/footfall/` (~/.config/footfall/)
//! - State/Logs: `$XDG_STATE_HOME/footfall/` (~/.local/state/footfall/)

use crate::error::{Error, Result};
use crate::types::Granularity;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name prefix of the rolling log files
pub const LOG_FILE_PREFIX: &str = "footfall";
/// File name suffix of the rolling log files
pub const LOG_FILE_SUFFIX: &str = "log";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Report defaults
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied when a report request leaves a parameter out
#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Leaderboard size when the request has no limit
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Bucket unit when the request has no granularity
    #[serde(default = "default_granularity")]
    pub default_granularity: Granularity,

    /// Label that marks an identity as an employee
    #[serde(default = "default_staff_label")]
    pub staff_label: String,

    /// Page size for visit listings when the request has none
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_granularity: default_granularity(),
            staff_label: default_staff_label(),
            default_page_size: default_page_size(),
        }
    }
}

fn default_limit() -> i64 {
    5
}

fn default_granularity() -> Granularity {
    Granularity::Daily
}

fn default_staff_label() -> String {
    "staff".to_string()
}

fn default_page_size() -> usize {
    10
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.reports.default_limit <= 0 {
            return Err(Error::Config(
                "reports.default_limit must be a positive number".to_string(),
            ));
        }
        if self.reports.default_page_size == 0 {
            return Err(Error::Config(
                "reports.default_page_size must be at least 1".to_string(),
            ));
        }
        if self.reports.staff_label.trim().is_empty() {
            return Err(Error::Config(
                "reports.staff_label must not be empty".to_string(),
            ));
        }
        if self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/footfall/config.toml` (~/.config/footfall/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("footfall").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/footfall/` (~/.local/state/footfall/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("footfall")
    }

    /// Returns the path of the log file written on `date`
    ///
    /// The daily rolling appender names files `footfall.2025-02-17.log`.
    pub fn log_path(date: NaiveDate) -> PathBuf {
        Self::state_dir().join(format!(
            "{}.{}.{}",
            LOG_FILE_PREFIX,
            date.format("%Y-%m-%d"),
            LOG_FILE_SUFFIX
        ))
    }
}
