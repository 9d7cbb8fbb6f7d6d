//! In-memory chat gateway.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::{HistoricMessage, Outgoing, Reaction};
use tallyd::gateway::{ChannelOps, GatewayError};

/// One observed gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Event {
    Sent { id: String, message: Outgoing },
    Deleted(String),
    Reacted(String, Reaction),
    Pinned(String),
    Unpinned(String),
}

/// Gateway that records every call and serves a fixed channel history.
#[derive(Default)]
pub struct FakeGateway {
    events: Mutex<Vec<Event>>,
    pinned: Mutex<Vec<String>>,
    history: Mutex<Vec<HistoricMessage>>,
    next_id: AtomicU64,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Replace the channel history, newest first.
    pub fn set_history(&self, history: Vec<HistoricMessage>) {
        *self.history.lock() = history;
    }

    pub fn pinned(&self) -> Vec<String> {
        self.pinned.lock().clone()
    }
}

#[async_trait]
impl ChannelOps for FakeGateway {
    async fn send(&self, _channel: &str, message: Outgoing) -> Result<String, GatewayError> {
        let id = format!("sent-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.events.lock().push(Event::Sent {
            id: id.clone(),
            message,
        });
        Ok(id)
    }

    async fn delete(&self, _channel: &str, message: &str) -> Result<(), GatewayError> {
        self.events.lock().push(Event::Deleted(message.to_string()));
        Ok(())
    }

    async fn react(&self, _channel: &str, message: &str, reaction: Reaction) -> Result<(), GatewayError> {
        self.events.lock().push(Event::Reacted(message.to_string(), reaction));
        Ok(())
    }

    async fn pin(&self, _channel: &str, message: &str) -> Result<(), GatewayError> {
        self.events.lock().push(Event::Pinned(message.to_string()));
        self.pinned.lock().push(message.to_string());
        Ok(())
    }

    async fn unpin(&self, _channel: &str, message: &str) -> Result<(), GatewayError> {
        self.events.lock().push(Event::Unpinned(message.to_string()));
        self.pinned.lock().retain(|m| m != message);
        Ok(())
    }

    async fn fetch_pinned(&self, _channel: &str) -> Result<Vec<String>, GatewayError> {
        Ok(self.pinned.lock().clone())
    }

    async fn fetch_history(
        &self,
        _channel: &str,
        _before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<HistoricMessage>, GatewayError> {
        Ok(self.history.lock().iter().take(limit).cloned().collect())
    }
}
