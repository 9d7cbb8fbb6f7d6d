//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// API Defaults
// =============================================================================

pub fn default_api_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "data/tallyd.db".to_string()
}

// =============================================================================
// Counting Defaults
// =============================================================================

pub fn default_backfill_window() -> usize {
    tally_core::BACKFILL_WINDOW
}

// =============================================================================
// Background Task Defaults
// =============================================================================

pub fn default_snapshot_interval() -> u64 {
    3600
}

pub fn default_heartbeat_interval() -> u64 {
    60
}
