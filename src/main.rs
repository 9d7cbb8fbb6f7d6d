//! tallyd - counting game service.
//!
//! Loads configuration, opens the guild store and serves the REST API while
//! the periodic history and heartbeat tasks run alongside. Chat adapters
//! embed [`tallyd::counting::CountingService`] and feed it gateway events.

use std::sync::Arc;
use std::time::Duration;

use tallyd::config::{Config, LogFormat, validate};
use tallyd::counting::CountingService;
use tallyd::store::{GuildStore, SqliteStore};
use tallyd::{http, metrics, tasks};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).inspect_err(|e| {
        eprintln!("Failed to load config {}: {}", config_path, e);
    })?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(code = e.error_code(), error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    info!(server = %config.server.name, path = %config_path, "Starting tallyd");

    // Initialize database
    let store = SqliteStore::open(&config.database.path).await?;
    let guilds = store.keys().await?;
    info!(guilds = guilds.len(), path = %config.database.path, "Guild store opened");

    let service = Arc::new(
        CountingService::new(Arc::new(store)).with_backfill_window(config.counting.backfill_window),
    );

    metrics::init();
    info!("Metrics initialized");

    if config.history.snapshot_interval_secs == 0 {
        info!("Count history snapshots disabled");
    } else {
        tasks::spawn_snapshot_task(
            Arc::clone(&service),
            Duration::from_secs(config.history.snapshot_interval_secs),
        );
        info!(every_secs = config.history.snapshot_interval_secs, "History snapshot task started");
    }

    if let Some(url) = config.heartbeat.url.clone() {
        tasks::spawn_heartbeat_task(url, Duration::from_secs(config.heartbeat.interval_secs));
        info!(every_secs = config.heartbeat.interval_secs, "Heartbeat task started");
    }

    let app = http::router(Arc::clone(&service), &config.api);
    tokio::select! {
        result = http::run_http_server(config.api.address, app) => {
            result.inspect_err(|e| error!(error = %e, "API server failed"))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("tallyd stopped");
    Ok(())
}
