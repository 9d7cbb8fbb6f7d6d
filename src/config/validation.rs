//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("counting.backfill_window must be between 1 and 1000, got {0}")]
    InvalidBackfillWindow(usize),
    #[error("heartbeat.interval_secs must be at least 1")]
    InvalidHeartbeatInterval,
    #[error("heartbeat.url must start with http:// or https://, got '{0}'")]
    InvalidHeartbeatUrl(String),
    #[error("api.fallback_redirect must start with http:// or https://, got '{0}'")]
    InvalidFallbackRedirect(String),
}

impl ValidationError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingServerName => "missing_server_name",
            Self::DatabasePathInvalid(_) => "database_path_invalid",
            Self::InvalidBackfillWindow(_) => "invalid_backfill_window",
            Self::InvalidHeartbeatInterval => "invalid_heartbeat_interval",
            Self::InvalidHeartbeatUrl(_) => "invalid_heartbeat_url",
            Self::InvalidFallbackRedirect(_) => "invalid_fallback_redirect",
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    // Database path validation
    let db = &config.database;
    if db.path != ":memory:" {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    let window = config.counting.backfill_window;
    if window == 0 || window > 1000 {
        errors.push(ValidationError::InvalidBackfillWindow(window));
    }

    if let Some(ref url) = config.heartbeat.url {
        if !is_http_url(url) {
            errors.push(ValidationError::InvalidHeartbeatUrl(url.clone()));
        }
        if config.heartbeat.interval_secs == 0 {
            errors.push(ValidationError::InvalidHeartbeatInterval);
        }
    }

    if let Some(ref target) = config.api.fallback_redirect
        && !is_http_url(target)
    {
        errors.push(ValidationError::InvalidFallbackRedirect(target.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
