//! SQLite-backed guild store.

use super::{GuildStore, StoreError};
use crate::db::Database;
use async_trait::async_trait;
use tally_core::{ChannelState, Mutation};

#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (and migrate) the database at `path`.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        Ok(Self::new(Database::new(path).await?))
    }
}

#[async_trait]
impl GuildStore for SqliteStore {
    async fn get(&self, guild: &str) -> Result<ChannelState, StoreError> {
        Ok(self.db.guilds().load(guild).await?.unwrap_or_default())
    }

    async fn apply(&self, guild: &str, mutations: &[Mutation]) -> Result<(), StoreError> {
        self.db.guilds().apply(guild, mutations).await?;
        Ok(())
    }

    async fn delete(&self, guild: &str) -> Result<bool, StoreError> {
        Ok(self.db.guilds().delete(guild).await?)
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.db.guilds().ids().await?)
    }

    async fn snapshot(&self) -> Result<Vec<(String, ChannelState)>, StoreError> {
        Ok(self.db.guilds().load_all().await?)
    }
}
