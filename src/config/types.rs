//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_api_address, default_backfill_window, default_database_path,
    default_heartbeat_interval, default_snapshot_interval,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "config_io",
            Self::Parse(_) => "config_parse",
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service identity.
    pub server: ServerConfig,
    /// Read API listener.
    #[serde(default)]
    pub api: ApiConfig,
    /// SQLite storage.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Game engine tuning.
    #[serde(default)]
    pub counting: CountingConfig,
    /// Count history snapshots.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Optional uptime monitor.
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Display name used in logs.
    pub name: String,
}

/// REST API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (default: 0.0.0.0:3000).
    #[serde(default = "default_api_address")]
    pub address: SocketAddr,
    /// Route `PATCH /servers/:id`. Authorization is left to the reverse proxy.
    #[serde(default)]
    pub admin: bool,
    /// Unknown routes redirect here instead of returning 404.
    #[serde(default)]
    pub fallback_redirect: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: default_api_address(),
            admin: false,
            fallback_redirect: None,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format; `RUST_LOG` still controls the level.
    #[serde(default)]
    pub format: LogFormat,
}

/// Counting engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CountingConfig {
    /// History messages examined per guild when catching up after downtime.
    #[serde(default = "default_backfill_window")]
    pub backfill_window: usize,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            backfill_window: default_backfill_window(),
        }
    }
}

/// Count history configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Seconds between snapshots of every guild's count. 0 disables.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval(),
        }
    }
}

/// Push-style uptime monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatConfig {
    /// URL to GET on every beat. Disabled when absent.
    #[serde(default)]
    pub url: Option<String>,
    /// Seconds between beats.
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: default_heartbeat_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str("[server]\nname = \"tally\"\n").unwrap();
        assert_eq!(config.api.address, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert!(!config.api.admin);
        assert_eq!(config.database.path, "data/tallyd.db");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.counting.backfill_window, 100);
        assert_eq!(config.history.snapshot_interval_secs, 3600);
        assert_eq!(config.heartbeat.url, None);
        assert_eq!(config.heartbeat.interval_secs, 60);
    }

    #[test]
    fn full_config_parses() {
        let toml = r#"
[server]
name = "tally"

[api]
address = "127.0.0.1:8080"
admin = true
fallback_redirect = "https://example.org"

[database]
path = ":memory:"

[logging]
format = "json"

[counting]
backfill_window = 25

[history]
snapshot_interval_secs = 60

[heartbeat]
url = "https://status.example.org/push"
interval_secs = 30
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.api.admin);
        assert_eq!(config.api.fallback_redirect.as_deref(), Some("https://example.org"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.counting.backfill_window, 25);
        assert_eq!(config.heartbeat.interval_secs, 30);
    }

    #[test]
    fn missing_server_section_is_a_parse_error() {
        assert!(toml::from_str::<Config>("[api]\nadmin = true\n").is_err());
    }

    #[test]
    fn load_reports_io_errors() {
        let err = Config::load("/nonexistent/tallyd.toml").unwrap_err();
        assert_eq!(err.error_code(), "config_io");
    }
}
