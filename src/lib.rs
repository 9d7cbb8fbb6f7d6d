//! tallyd - counting game service.
//!
//! Wires the pure rule engine in `tally-core` to persistent storage, a chat
//! gateway, operator commands and a read-only REST API.

pub mod commands;
pub mod config;
pub mod counting;
pub mod db;
pub mod error;
pub mod gateway;
pub mod http;
pub mod metrics;
pub mod store;
pub mod tasks;
pub mod telemetry;
