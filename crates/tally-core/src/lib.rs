//! # tally-core
//!
//! The decision logic behind the tallyd counting game.
//!
//! Members of a chat channel post successive integers. This crate decides,
//! for each incoming post, whether it advances the count, resets it, or is
//! rejected, and folds the accumulated per-member counters into leaderboards.
//!
//! Nothing in here performs I/O. The engine returns data ([`Evaluation`],
//! [`Effect`], [`Mutation`]) and the caller persists and executes it.
//!
//! ## Quick Start
//!
//! ```rust
//! use tally_core::{ChannelState, IncomingMessage, Verdict, evaluate};
//!
//! let mut state = ChannelState::enabled("counting");
//! let msg = IncomingMessage::new("m1", "alice", "1");
//!
//! let eval = evaluate(&state, &msg);
//! assert_eq!(eval.verdict, Verdict::Accepted { value: 1 });
//! state = eval.state;
//! assert_eq!(state.count, 1);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod effect;
pub mod engine;
pub mod error;
pub mod event;
pub mod leaderboard;
pub mod member;
pub mod parse;
pub mod recovery;
pub mod settings;
pub mod state;

pub use effect::{Effect, Embed, Notice, Outgoing, Reaction, Tone};
pub use engine::{Evaluation, Rejection, Verdict, Violation, evaluate};
pub use error::CoreError;
pub use event::{HistoricMessage, IncomingMessage, MessageCreated, MessageDeleted};
pub use leaderboard::{
    DEFAULT_TOP, Metric, RankEntry, Ranking, aggregate_members, cf_ratio, rank_channel, rank_global,
    rank_servers,
};
pub use member::MemberRecord;
pub use recovery::{BACKFILL_WINDOW, BackfillOutcome, Repost, on_message_deleted, scan_history};
pub use settings::{SettingKey, Settings, Visibility};
pub use state::{ChannelState, HistoryPoint, Mutation};

/// Maximum number of pinned messages a channel may hold.
pub const PIN_CAP: usize = 50;

/// Counts divisible by this value are milestones.
pub const MILESTONE_INTERVAL: i64 = 10;

/// Format a member mention as the chat platform renders it.
pub fn mention(member_id: &str) -> String {
    format!("<@{}>", member_id)
}
