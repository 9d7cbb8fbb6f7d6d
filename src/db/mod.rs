//! SQLite persistence for guild state.
//!
//! Three tables back a [`tally_core::ChannelState`]:
//! - `guilds`: count, previous pointers and settings
//! - `members`: per-member counters
//! - `count_history`: the count time series

mod guilds;

pub use guilds::GuildRepository;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("integrity check failed: {0}")]
    Integrity(String),
    #[error("corrupt row for guild {guild}: {reason}")]
    Corrupt { guild: String, reason: String },
}

impl DbError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlx(_) => "sqlx",
            Self::Migration(_) => "migration",
            Self::Integrity(_) => "integrity",
            Self::Corrupt { .. } => "corrupt_row",
        }
    }
}

/// Pooled handle to the guild database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// `":memory:"` opens a private in-memory database, one per call.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let (options, max_connections) = connect_options(path);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;
        info!(path = %path, "Database connected");

        sqlx::migrate!("./migrations").run(&pool).await?;

        let integrity: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&pool)
            .await?;
        if integrity != "ok" {
            tracing::error!(integrity_check = %integrity, "Guild database is corrupt");
            return Err(DbError::Integrity(integrity));
        }

        Ok(Self { pool })
    }

    /// Guild rows.
    pub fn guilds(&self) -> GuildRepository<'_> {
        GuildRepository::new(&self.pool)
    }
}

fn connect_options(path: &str) -> (SqliteConnectOptions, u32) {
    if path == ":memory:" {
        // Shared cache keeps the pool's connections on one database; the
        // unique name keeps parallel stores apart.
        let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
        let uri = format!(
            "file:tallyd-memdb-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            id
        );
        let options = SqliteConnectOptions::new()
            .filename(uri)
            .shared_cache(true)
            .foreign_keys(true)
            .create_if_missing(true);
        return (options, 1);
    }

    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "Failed to create database directory");
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .foreign_keys(true)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);
    (options, 5)
}
