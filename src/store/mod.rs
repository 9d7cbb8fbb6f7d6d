//! Guild state storage abstraction.
//!
//! The counting service never talks to SQLite directly; it goes through
//! [`GuildStore`]. Both backends apply a mutation batch atomically, so a
//! count can never be persisted without the message that produced it.

use async_trait::async_trait;
use tally_core::{ChannelState, Mutation};
use thiserror::Error;

use crate::db::DbError;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbError),
}

impl StoreError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(e) => e.error_code(),
        }
    }
}

#[async_trait]
pub trait GuildStore: Send + Sync {
    /// State of `guild`, or the default (disabled) state when absent.
    async fn get(&self, guild: &str) -> Result<ChannelState, StoreError>;

    /// Apply `mutations` in order as one atomic batch, creating the guild if needed.
    async fn apply(&self, guild: &str, mutations: &[Mutation]) -> Result<(), StoreError>;

    /// Remove a guild entirely. Returns whether it existed.
    async fn delete(&self, guild: &str) -> Result<bool, StoreError>;

    /// Every stored guild id.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Point-in-time copy of every guild.
    async fn snapshot(&self) -> Result<Vec<(String, ChannelState)>, StoreError>;
}
