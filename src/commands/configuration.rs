//! Commands that change a guild's game configuration.

use super::thousands;
use crate::counting::CountingService;
use crate::error::{CountingError, CountingResult};
use tally_core::{CoreError, Embed, Mutation, Outgoing, SettingKey, Tone};
use tracing::info;

fn success(description: impl Into<String>) -> Outgoing {
    Embed::new(Tone::Success, description).into()
}

fn non_negative(count: i64) -> CountingResult<i64> {
    if count < 0 {
        return Err(CoreError::NegativeCount(count).into());
    }
    Ok(count)
}

/// Enable the game in `channel`, optionally starting from `count`.
pub async fn setup(
    service: &CountingService,
    guild: &str,
    channel: &str,
    count: Option<i64>,
) -> CountingResult<Outgoing> {
    let count = count.map(non_negative).transpose()?;
    service
        .modify(guild, |state| {
            if state.is_enabled() {
                return Err(CountingError::AlreadyEnabled);
            }
            let mut mutations = vec![Mutation::SetChannel(Some(channel.to_string()))];
            if let Some(count) = count {
                mutations.push(Mutation::SetCount(count));
            }
            Ok(mutations)
        })
        .await?;
    info!(guild = %guild, channel = %channel, "Counting enabled");
    Ok(success("The counting system has been enabled in this server."))
}

/// Remove every trace of the game from `guild`.
pub async fn disable(service: &CountingService, guild: &str) -> CountingResult<Outgoing> {
    service.disable(guild).await?;
    Ok(success("The counting system has been disabled in this server."))
}

/// Set a toggle, or flip it when `enabled` is not given.
pub async fn settings(
    service: &CountingService,
    guild: &str,
    key: SettingKey,
    enabled: Option<bool>,
) -> CountingResult<Outgoing> {
    let state = service
        .modify(guild, |state| {
            if !state.is_enabled() {
                return Err(CountingError::NotEnabled);
            }
            let value = enabled.unwrap_or(!state.settings.get(key));
            Ok(vec![Mutation::SetSetting(key, value)])
        })
        .await?;

    let value = state.settings.get(key);
    info!(guild = %guild, setting = %key, value, "Setting changed");
    let reply = match key {
        SettingKey::Unlisted => format!(
            "This server is now {}.",
            state.settings.visibility
        ),
        _ => format!("{} {}.", if value { "Enabled" } else { "Disabled" }, key.label()),
    };
    Ok(success(reply))
}

/// Move the game to another channel.
pub async fn update_channel(
    service: &CountingService,
    guild: &str,
    channel: &str,
) -> CountingResult<Outgoing> {
    service
        .modify(guild, |state| {
            if !state.is_enabled() {
                return Err(CountingError::NotEnabled);
            }
            Ok(vec![Mutation::SetChannel(Some(channel.to_string()))])
        })
        .await?;
    info!(guild = %guild, channel = %channel, "Counting channel changed");
    Ok(success(format!("The counting channel has been set to <#{}>.", channel)))
}

/// Overwrite the count.
pub async fn update_count(
    service: &CountingService,
    guild: &str,
    count: i64,
) -> CountingResult<Outgoing> {
    let count = non_negative(count)?;
    service
        .modify(guild, |state| {
            if !state.is_enabled() {
                return Err(CountingError::NotEnabled);
            }
            Ok(vec![Mutation::SetCount(count)])
        })
        .await?;
    info!(guild = %guild, count, "Count set by operator");
    Ok(success(format!("The count has been set to {}.", thousands(count))))
}
