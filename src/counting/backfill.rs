//! Catching up with counts posted while the service was offline.

use super::CountingService;
use crate::error::{CountingError, CountingResult};
use crate::gateway::ChannelOps;
use crate::metrics;
use tally_core::{BackfillOutcome, Embed, Mutation, Tone, scan_history};
use tracing::{Instrument, info, info_span, warn};

/// Text posted when a scan cannot find the current count.
pub const BACKFILL_FAILED: &str = "I tried updating this channel's count, but failed. \
Please ask a staff member to run `update count` to update the count.";

impl CountingService {
    /// Scan one guild's channel history and adopt the newest count found.
    ///
    /// Returns `None` when the guild was skipped: not enabled, nothing
    /// counted yet, or history could not be fetched.
    pub async fn backfill(
        &self,
        ops: &dyn ChannelOps,
        guild: &str,
    ) -> CountingResult<Option<BackfillOutcome>> {
        let span = info_span!("backfill", guild = %guild);
        self.backfill_guild(ops, guild).instrument(span).await
    }

    async fn backfill_guild(
        &self,
        ops: &dyn ChannelOps,
        guild: &str,
    ) -> CountingResult<Option<BackfillOutcome>> {
        let lock = self.guild_lock(guild);
        let _guard = lock.lock().await;

        let state = self.load(guild).await?;
        let (Some(channel), Some(_)) = (state.channel_id.as_deref(), state.previous_message_id.as_deref())
        else {
            return Ok(None);
        };

        let history = match ops.fetch_history(channel, None, self.backfill_window).await {
            Ok(history) => history,
            Err(e) => {
                warn!(channel = %channel, error = %e, "Failed to fetch channel history");
                metrics::record_gateway_error("fetch_history");
                return Ok(None);
            }
        };

        let outcome = scan_history(&state, &history, self.backfill_window);
        match outcome {
            BackfillOutcome::Unchanged => {
                info!(count = state.count, "Backfill found count unchanged");
            }
            BackfillOutcome::Adopt(count) => {
                self.persist(guild, &[Mutation::SetCount(count)]).await?;
                info!(previous = state.count, count, "Backfill adopted count from history");
            }
            BackfillOutcome::Failed => {
                warn!(
                    scanned = history.len(),
                    window = self.backfill_window,
                    "Backfill could not find the count"
                );
                let notice = Embed::new(Tone::Danger, BACKFILL_FAILED).with_title("\u{274C} Oh no!");
                if let Err(e) = ops.send(channel, notice.into()).await {
                    warn!(channel = %channel, error = %e, "Failed to report backfill failure");
                    metrics::record_gateway_error("send");
                }
            }
        }
        metrics::record_backfill(outcome.as_str());
        Ok(Some(outcome))
    }

    /// Backfill every stored guild, one at a time.
    ///
    /// A failing guild is logged and skipped. Returns the outcome of every
    /// guild that was scanned.
    pub async fn backfill_all(
        &self,
        ops: &dyn ChannelOps,
    ) -> CountingResult<Vec<(String, BackfillOutcome)>> {
        let guilds = self.store.keys().await.map_err(|e| {
            metrics::record_store_error(e.error_code());
            CountingError::from(e)
        })?;

        let mut outcomes = Vec::new();
        for guild in guilds {
            match self.backfill(ops, &guild).await {
                Ok(Some(outcome)) => outcomes.push((guild, outcome)),
                Ok(None) => {}
                Err(e) => warn!(guild = %guild, error = %e, "Backfill failed"),
            }
        }
        info!(scanned = outcomes.len(), "Startup backfill complete");
        Ok(outcomes)
    }
}
