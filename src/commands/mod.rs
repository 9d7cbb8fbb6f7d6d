//! Operator and member commands.
//!
//! Commands are presenters: they read or write guild state through the
//! counting service and return the reply to post. A chat adapter parses
//! its own command syntax into [`Command`] and calls [`execute`].
//!
//! - [`configuration`]: setup, disable, settings, update (writes)
//! - [`information`]: count, user, leaderboard (reads)

pub mod configuration;
pub mod information;

pub use information::Scope;

use crate::counting::CountingService;
use crate::error::CountingResult;
use crate::telemetry::spans;
use tally_core::{Metric, Outgoing, SettingKey};
use tracing::{Instrument, debug, warn};

/// A parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Setup { channel: String, count: Option<i64> },
    Disable,
    Settings { key: SettingKey, enabled: Option<bool> },
    UpdateChannel { channel: String },
    UpdateCount { count: i64 },
    Count,
    User { member: String },
    Leaderboard { scope: Scope, metric: Metric },
}

impl Command {
    /// Name used in logs and spans.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup { .. } => "setup",
            Self::Disable => "disable",
            Self::Settings { .. } => "settings",
            Self::UpdateChannel { .. } => "update_channel",
            Self::UpdateCount { .. } => "update_count",
            Self::Count => "count",
            Self::User { .. } => "user",
            Self::Leaderboard { .. } => "leaderboard",
        }
    }
}

/// Run `command` for `guild` and produce the reply.
///
/// Errors become danger embeds. Not-enabled is expected operator guidance
/// and only logged at debug.
pub async fn execute(service: &CountingService, guild: &str, command: Command) -> Outgoing {
    let name = command.name();
    let span = spans::command(name, guild);
    match run(service, guild, command).instrument(span).await {
        Ok(reply) => reply,
        Err(e) => {
            if e.error_code() == "not_enabled" {
                debug!(guild = %guild, command = name, "Command used before setup");
            } else {
                warn!(guild = %guild, command = name, error = %e, "Command failed");
            }
            e.to_reply()
        }
    }
}

async fn run(service: &CountingService, guild: &str, command: Command) -> CountingResult<Outgoing> {
    let store = service.store().as_ref();
    match command {
        Command::Setup { channel, count } => configuration::setup(service, guild, &channel, count).await,
        Command::Disable => configuration::disable(service, guild).await,
        Command::Settings { key, enabled } => configuration::settings(service, guild, key, enabled).await,
        Command::UpdateChannel { channel } => configuration::update_channel(service, guild, &channel).await,
        Command::UpdateCount { count } => configuration::update_count(service, guild, count).await,
        Command::Count => information::count(store, guild).await,
        Command::User { member } => information::user(store, guild, &member).await,
        Command::Leaderboard { scope, metric } => information::leaderboard(store, &scope, metric).await,
    }
}

/// Format an integer with `,` thousands separators.
pub fn thousands(n: impl Into<i128>) -> String {
    let n: i128 = n.into();
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
