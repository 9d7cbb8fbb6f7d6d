//! Gateway event payloads.

use serde::{Deserialize, Serialize};

/// A message was posted somewhere in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreated {
    pub id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
}

/// A message was deleted somewhere in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeleted {
    pub id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub pinned: bool,
}

/// The part of a message the engine looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message id.
    pub id: String,
    /// Author id.
    pub author_id: String,
    /// Raw content.
    pub content: String,
}

impl IncomingMessage {
    /// Build from parts.
    pub fn new(id: impl Into<String>, author_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            content: content.into(),
        }
    }
}

impl From<&MessageCreated> for IncomingMessage {
    fn from(event: &MessageCreated) -> Self {
        Self::new(&event.id, &event.author_id, &event.content)
    }
}

/// A message read back from channel history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricMessage {
    pub id: String,
    pub author_id: String,
    pub content: String,
}

impl HistoricMessage {
    /// Build from parts.
    pub fn new(id: impl Into<String>, author_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            content: content.into(),
        }
    }
}
