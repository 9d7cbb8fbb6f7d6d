//! Periodic background tasks.
//!
//! - count history snapshots of every stored guild
//! - heartbeat pings to an external uptime monitor

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::counting::CountingService;

/// Append the current count of every stored guild to its history.
pub async fn snapshot_once(service: &CountingService) -> usize {
    let now = chrono::Utc::now().timestamp_millis();
    match service.record_history(now).await {
        Ok(recorded) => {
            info!(guilds = recorded, "Count history snapshot recorded");
            recorded
        }
        Err(e) => {
            warn!(error = %e, "Count history snapshot failed");
            0
        }
    }
}

/// Snapshot history every `every`. The first tick fires immediately.
pub fn spawn_snapshot_task(service: Arc<CountingService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            snapshot_once(&service).await;
        }
    })
}

/// Ping the monitor once.
pub async fn heartbeat_once(client: &reqwest::Client, url: &str) -> Result<(), reqwest::Error> {
    client.get(url).send().await?.error_for_status()?;
    Ok(())
}

/// Ping `url` every `every`.
pub fn spawn_heartbeat_task(url: String, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match heartbeat_once(&client, &url).await {
                Ok(()) => debug!("Heartbeat sent"),
                Err(e) => warn!(error = %e, "Heartbeat failed"),
            }
        }
    })
}
