//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that collect every problem at once

mod defaults;
mod types;
pub mod validation;

pub use types::{
    ApiConfig, Config, ConfigError, CountingConfig, DatabaseConfig, HeartbeatConfig,
    HistoryConfig, LogFormat, LoggingConfig, ServerConfig,
};
pub use validation::{ValidationError, validate};
