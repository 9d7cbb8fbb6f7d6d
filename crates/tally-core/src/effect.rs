//! Side effects the engine asks the gateway to perform.
//!
//! Effects are instructions, not actions: the counting service walks the
//! list after the state change has been persisted.

use crate::engine::Violation;
use crate::mention;
use serde::{Deserialize, Serialize};

/// Reaction emoji placed on a counting message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    /// ✅
    Success,
    /// ❌
    Failure,
}

impl Reaction {
    /// Unicode emoji for this reaction.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Success => "\u{2705}",
            Self::Failure => "\u{274C}",
        }
    }
}

/// Color family of an embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Neutral information.
    Primary,
    /// Confirmation of an operator action.
    Success,
    /// Something went wrong.
    Danger,
}

/// Rich message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Optional heading.
    pub title: Option<String>,
    /// Body text.
    pub description: String,
    /// Optional footer line.
    pub footer: Option<String>,
    /// Color family.
    pub tone: Tone,
}

impl Embed {
    /// Embed with a body only.
    pub fn new(tone: Tone, description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            footer: None,
            tone,
        }
    }

    /// Builder: set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: set the footer.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Message content to send to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outgoing {
    /// Plain text.
    Text {
        /// Message body.
        content: String,
    },
    /// Rich embed.
    Embed(Embed),
}

impl Outgoing {
    /// Plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }
}

impl From<Embed> for Outgoing {
    fn from(embed: Embed) -> Self {
        Self::Embed(embed)
    }
}

/// Reset announcement naming the member and what they did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Member that caused the reset.
    pub member_id: String,
    /// Rule that was broken.
    pub violation: Violation,
}

impl Notice {
    /// Render as the danger embed posted in the channel.
    pub fn to_outgoing(&self) -> Outgoing {
        let what = match self.violation {
            Violation::OneByOne => "counted more than once",
            Violation::Talking => "talked in their count message",
            Violation::Format | Violation::WrongValue { .. } => "got the count wrong",
        };
        Embed::new(
            Tone::Danger,
            format!(
                "{} {}. The count has been reset to 0!",
                mention(&self.member_id),
                what
            ),
        )
        .with_title("\u{274C} Oh no!")
        .into()
    }
}

/// Instruction for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// React to the evaluated message.
    React {
        /// Target message.
        message_id: String,
        /// Emoji to add.
        reaction: Reaction,
    },
    /// Delete the evaluated message.
    Delete {
        /// Target message.
        message_id: String,
    },
    /// Announce a reset in the channel.
    Announce(Notice),
    /// Pin a milestone, unpinning the oldest pin when at the cap.
    PinMilestone {
        /// Target message.
        message_id: String,
    },
}

impl Effect {
    /// Static label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::React { .. } => "react",
            Self::Delete { .. } => "delete",
            Self::Announce(_) => "announce",
            Self::PinMilestone { .. } => "pin_milestone",
        }
    }
}
