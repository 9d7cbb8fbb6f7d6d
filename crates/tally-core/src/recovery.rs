//! Keeping the channel consistent with the stored count.
//!
//! Two situations are covered: the last accepted message was deleted
//! ([`on_message_deleted`]), and the service was offline while members kept
//! counting ([`scan_history`]).

use crate::event::{HistoricMessage, MessageDeleted};
use crate::mention;
use crate::parse::{CountToken, count_token, is_number, leading_count};
use crate::state::ChannelState;

/// Default number of history messages examined by a backfill scan.
pub const BACKFILL_WINDOW: usize = 100;

/// Instruction to recreate a deleted count message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repost {
    /// Text to send, `"<@author>: 17"`.
    pub content: String,
    /// Pin the recreated message.
    pub pin: bool,
}

/// Decide whether a deletion needs a repost.
///
/// Only the message recorded as `previous_message_id` is recreated, and only
/// while `no_deletion` is on. The repost carries the count token of the
/// deleted content as typed minus separators, so `"1,000 woo"` comes back as
/// `"<@a>: 1000"` and `"007"` stays `"007"`.
pub fn on_message_deleted(state: &ChannelState, deleted: &MessageDeleted) -> Option<Repost> {
    if deleted.is_bot
        || !state.settings.no_deletion
        || !state.is_counting_channel(&deleted.channel_id)
        || state.previous_message_id.as_deref() != Some(deleted.id.as_str())
    {
        return None;
    }

    let token = count_token(&deleted.content);
    let number = if is_number(&token) {
        token
    } else {
        // Deleted content should always hold the accepted count; fall back to
        // the stored value if it somehow does not.
        state.count.to_string()
    };

    Some(Repost {
        content: format!("{}: {}", mention(&deleted.author_id), number),
        pin: deleted.pinned,
    })
}

/// Result of a backfill scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// Newest well-formed count equals the stored count.
    Unchanged,
    /// Newest well-formed count differs; adopt it.
    Adopt(i64),
    /// No well-formed count within the window.
    Failed,
}

impl BackfillOutcome {
    /// Static label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Adopt(_) => "adopted",
            Self::Failed => "failed",
        }
    }
}

/// Walk `history` (newest first) looking for the most recent count.
///
/// At most `window` messages are examined. Numbers too large for an `i64`
/// are skipped like any other chatter.
pub fn scan_history(state: &ChannelState, history: &[HistoricMessage], window: usize) -> BackfillOutcome {
    history
        .iter()
        .take(window)
        .find_map(|message| match leading_count(&message.content) {
            CountToken::Value(n) => Some(n),
            CountToken::Overflow | CountToken::Malformed => None,
        })
        .map_or(BackfillOutcome::Failed, |n| {
            if n == state.count {
                BackfillOutcome::Unchanged
            } else {
                BackfillOutcome::Adopt(n)
            }
        })
}
