//! Read-only commands: count, member stats, leaderboards.

use super::thousands;
use crate::error::{CountingError, CountingResult};
use crate::store::GuildStore;
use tally_core::{
    DEFAULT_TOP, Embed, Metric, Outgoing, Ranking, Tone, mention, rank_channel, rank_global,
    rank_servers,
};

/// Which leaderboard to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Listed guilds ranked by count.
    Servers,
    /// Members of one guild.
    Server(String),
    /// Members across every guild.
    Global,
}

async fn enabled_state(store: &dyn GuildStore, guild: &str) -> CountingResult<tally_core::ChannelState> {
    let state = store.get(guild).await?;
    if !state.is_enabled() {
        return Err(CountingError::NotEnabled);
    }
    Ok(state)
}

/// Current and next count of `guild`.
pub async fn count(store: &dyn GuildStore, guild: &str) -> CountingResult<Outgoing> {
    let state = enabled_state(store, guild).await?;
    Ok(Embed::new(
        Tone::Primary,
        format!(
            "The current count is **{}**.\nThe next count is **{}**.",
            thousands(state.count),
            thousands(i128::from(state.count) + 1)
        ),
    )
    .into())
}

/// A member's record in `guild`.
pub async fn user(store: &dyn GuildStore, guild: &str, member: &str) -> CountingResult<Outgoing> {
    let state = enabled_state(store, guild).await?;
    let record = state.member(member);
    let description = format!(
        "{}\n\n**Counts:** {}\n**Fails:** {}\n**C/F Ratio:** {}%",
        mention(member),
        thousands(record.counts),
        thousands(record.fails),
        record.cf_ratio()
    );
    Ok(Embed::new(Tone::Primary, description).with_title("User Stats").into())
}

/// Top entries of a leaderboard.
pub async fn leaderboard(store: &dyn GuildStore, scope: &Scope, metric: Metric) -> CountingResult<Outgoing> {
    let (title, ranking, members) = match scope {
        Scope::Servers => {
            let snapshot = store.snapshot().await?;
            let ranking = rank_servers(
                snapshot
                    .iter()
                    .filter(|(_, state)| state.is_enabled())
                    .map(|(id, state)| (id.as_str(), state)),
                DEFAULT_TOP,
            );
            (format!("Top {} Servers", DEFAULT_TOP), ranking, false)
        }
        Scope::Server(guild) => {
            let state = enabled_state(store, guild).await?;
            if state.members.is_empty() {
                return Ok(Embed::new(Tone::Danger, "No one has counted in this server yet.").into());
            }
            let ranking = rank_channel(&state, metric, DEFAULT_TOP);
            (format!("Top {} Users ({})", DEFAULT_TOP, metric.label()), ranking, true)
        }
        Scope::Global => {
            let snapshot = store.snapshot().await?;
            let ranking = rank_global(snapshot.iter().map(|(_, state)| state), metric, DEFAULT_TOP);
            (
                format!("Top {} Global Users ({})", DEFAULT_TOP, metric.label()),
                ranking,
                true,
            )
        }
    };

    let ratio = members && metric == Metric::CfRatio;
    let embed = Embed::new(Tone::Primary, render_lines(&ranking, members, ratio)).with_title(title);
    let embed = if ratio {
        embed
    } else {
        embed.with_footer(format!("Total: {}", thousands(ranking.total)))
    };
    Ok(embed.into())
}

fn render_lines(ranking: &Ranking, members: bool, ratio: bool) -> String {
    if ranking.is_empty() {
        return "Nothing to show yet.".to_string();
    }
    ranking
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let name = if members {
                mention(&entry.subject_id)
            } else {
                entry.subject_id.clone()
            };
            let value = if ratio {
                format!("{}%", entry.value)
            } else {
                thousands(entry.value)
            };
            format!("**{}**. {}: {}", i + 1, name, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
