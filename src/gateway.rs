//! Chat gateway capability surface.
//!
//! A gateway adapter (the chat platform session) implements [`ChannelOps`]
//! and forwards message events into [`crate::counting::CountingService`].
//! Nothing in this crate depends on a particular chat platform.

use async_trait::async_trait;
use tally_core::{HistoricMessage, Outgoing, Reaction};
use thiserror::Error;

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("unknown message: {0}")]
    UnknownMessage(String),
    #[error("missing permission: {0}")]
    MissingPermission(String),
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownChannel(_) => "unknown_channel",
            Self::UnknownMessage(_) => "unknown_message",
            Self::MissingPermission(_) => "missing_permission",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transport(_) => "transport",
        }
    }
}

/// Operations the counting service performs on a chat channel.
#[async_trait]
pub trait ChannelOps: Send + Sync {
    /// Post a message and return its id.
    async fn send(&self, channel: &str, message: Outgoing) -> Result<String, GatewayError>;

    /// Delete a message.
    async fn delete(&self, channel: &str, message: &str) -> Result<(), GatewayError>;

    /// Add a reaction to a message.
    async fn react(&self, channel: &str, message: &str, reaction: Reaction) -> Result<(), GatewayError>;

    /// Pin a message.
    async fn pin(&self, channel: &str, message: &str) -> Result<(), GatewayError>;

    /// Unpin a message.
    async fn unpin(&self, channel: &str, message: &str) -> Result<(), GatewayError>;

    /// Pinned message ids, oldest first.
    async fn fetch_pinned(&self, channel: &str) -> Result<Vec<String>, GatewayError>;

    /// Up to `limit` messages before `before` (or the newest), newest first.
    async fn fetch_history(
        &self,
        channel: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<HistoricMessage>, GatewayError>;
}
