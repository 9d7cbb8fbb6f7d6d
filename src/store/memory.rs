//! In-memory guild store.
//!
//! Used by tests and by deployments that do not need persistence.
//! Each guild's batch is applied while holding its map shard, so readers
//! never observe half of a batch.

use super::{GuildStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use tally_core::{ChannelState, Mutation};

#[derive(Debug, Default)]
pub struct MemoryStore {
    guilds: DashMap<String, ChannelState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuildStore for MemoryStore {
    async fn get(&self, guild: &str) -> Result<ChannelState, StoreError> {
        Ok(self
            .guilds
            .get(guild)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn apply(&self, guild: &str, mutations: &[Mutation]) -> Result<(), StoreError> {
        let mut entry = self.guilds.entry(guild.to_string()).or_default();
        entry.value_mut().apply_all(mutations);
        Ok(())
    }

    async fn delete(&self, guild: &str) -> Result<bool, StoreError> {
        Ok(self.guilds.remove(guild).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.guilds.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn snapshot(&self) -> Result<Vec<(String, ChannelState)>, StoreError> {
        let mut guilds: Vec<(String, ChannelState)> = self
            .guilds
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        guilds.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(guilds)
    }
}
