//! Counting service: the engine wired to a store and a gateway.
//!
//! Every read-modify-write of a guild runs under that guild's lock:
//! load state, evaluate, persist the mutation batch, then perform gateway
//! effects. Gateway failures are logged and counted but never undo a
//! persisted batch. Cross-guild work never contends.

mod backfill;
mod effect;

pub use effect::apply_effects;

use crate::error::{CountingError, CountingResult};
use crate::gateway::ChannelOps;
use crate::metrics;
use crate::store::GuildStore;
use crate::telemetry::{EvaluationTimer, spans};
use dashmap::DashMap;
use std::sync::Arc;
use tally_core::{
    BACKFILL_WINDOW, ChannelState, HistoryPoint, IncomingMessage, MessageCreated, MessageDeleted,
    Mutation, Outgoing, Verdict, evaluate, on_message_deleted,
};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, warn};

/// Shared counting service.
pub struct CountingService {
    store: Arc<dyn GuildStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    backfill_window: usize,
}

impl CountingService {
    pub fn new(store: Arc<dyn GuildStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            backfill_window: BACKFILL_WINDOW,
        }
    }

    /// Override how many history messages a backfill scan examines.
    pub fn with_backfill_window(mut self, window: usize) -> Self {
        self.backfill_window = window.max(1);
        self
    }

    /// The underlying store, for read-only snapshot consumers.
    pub fn store(&self) -> &Arc<dyn GuildStore> {
        &self.store
    }

    fn guild_lock(&self, guild: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(guild.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, guild: &str) -> CountingResult<ChannelState> {
        self.store.get(guild).await.map_err(|e| {
            error!(guild = %guild, error = %e, "Failed to load guild state");
            metrics::record_store_error(e.error_code());
            CountingError::from(e)
        })
    }

    async fn persist(&self, guild: &str, mutations: &[Mutation]) -> CountingResult<()> {
        if mutations.is_empty() {
            return Ok(());
        }
        self.store.apply(guild, mutations).await.map_err(|e| {
            error!(guild = %guild, error = %e, "Failed to persist guild state");
            metrics::record_store_error(e.error_code());
            CountingError::from(e)
        })
    }

    /// Handle a posted message.
    ///
    /// Returns `None` when the message was not evaluated (bot author, game
    /// disabled, or another channel).
    pub async fn on_message_created(
        &self,
        ops: &dyn ChannelOps,
        event: &MessageCreated,
    ) -> CountingResult<Option<Verdict>> {
        if event.is_bot {
            return Ok(None);
        }
        let span = spans::guild_event("message_created", &event.guild_id, &event.channel_id, &event.id);
        self.handle_created(ops, event).instrument(span).await
    }

    async fn handle_created(
        &self,
        ops: &dyn ChannelOps,
        event: &MessageCreated,
    ) -> CountingResult<Option<Verdict>> {
        let lock = self.guild_lock(&event.guild_id);
        let _guard = lock.lock().await;

        let state = self.load(&event.guild_id).await?;
        if !state.is_counting_channel(&event.channel_id) {
            return Ok(None);
        }

        let mut timer = EvaluationTimer::start();
        let evaluation = evaluate(&state, &IncomingMessage::from(event));
        self.persist(&event.guild_id, &evaluation.mutations).await?;
        timer.outcome(evaluation.verdict.outcome());

        match evaluation.verdict {
            Verdict::Accepted { value } => {
                debug!(member = %event.author_id, value, "Count accepted");
            }
            Verdict::Rejected(rejection) => {
                debug!(
                    member = %event.author_id,
                    violation = %rejection.violation,
                    "Count rejected"
                );
                if rejection.reset {
                    info!(
                        member = %event.author_id,
                        violation = %rejection.violation,
                        previous = state.count,
                        "Count reset"
                    );
                    metrics::record_reset(rejection.violation.code());
                }
            }
        }

        apply_effects(ops, &event.channel_id, &evaluation.effects).await;
        Ok(Some(evaluation.verdict))
    }

    /// Handle a deleted message, recreating it when it was the last count.
    ///
    /// Returns the id of the recreated message.
    pub async fn on_message_deleted(
        &self,
        ops: &dyn ChannelOps,
        event: &MessageDeleted,
    ) -> CountingResult<Option<String>> {
        if event.is_bot {
            return Ok(None);
        }
        let span = spans::guild_event("message_deleted", &event.guild_id, &event.channel_id, &event.id);
        self.handle_deleted(ops, event).instrument(span).await
    }

    async fn handle_deleted(
        &self,
        ops: &dyn ChannelOps,
        event: &MessageDeleted,
    ) -> CountingResult<Option<String>> {
        let lock = self.guild_lock(&event.guild_id);
        let _guard = lock.lock().await;

        let state = self.load(&event.guild_id).await?;
        let Some(repost) = on_message_deleted(&state, event) else {
            return Ok(None);
        };

        let new_id = match ops
            .send(&event.channel_id, Outgoing::text(repost.content))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Failed to repost deleted count");
                metrics::record_gateway_error("send");
                return Ok(None);
            }
        };

        let recorded = self
            .persist(
                &event.guild_id,
                &[Mutation::SetPreviousMessage(Some(new_id.clone()))],
            )
            .await;
        if let Err(e) = recorded {
            // The stored pointer still names the deleted message; drop the
            // repost so the channel matches it.
            if let Err(delete_err) = ops.delete(&event.channel_id, &new_id).await {
                warn!(error = %delete_err, repost = %new_id, "Failed to remove unrecorded repost");
                metrics::record_gateway_error("delete");
            }
            return Err(e);
        }
        metrics::record_repost();
        info!(member = %event.author_id, repost = %new_id, "Deleted count reposted");

        if repost.pin {
            effect::pin_with_cap(ops, &event.channel_id, &new_id).await;
        }
        Ok(Some(new_id))
    }

    /// Run an operator write under the guild lock.
    ///
    /// `plan` sees the current state and returns the mutations to apply (or
    /// an error to abort with). Returns the resulting state.
    pub async fn modify<F>(&self, guild: &str, plan: F) -> CountingResult<ChannelState>
    where
        F: FnOnce(&ChannelState) -> CountingResult<Vec<Mutation>>,
    {
        let lock = self.guild_lock(guild);
        let _guard = lock.lock().await;

        let mut state = self.load(guild).await?;
        let mutations = plan(&state)?;
        self.persist(guild, &mutations).await?;
        state.apply_all(&mutations);
        Ok(state)
    }

    /// Delete a guild's state entirely.
    pub async fn disable(&self, guild: &str) -> CountingResult<()> {
        let lock = self.guild_lock(guild);
        let _guard = lock.lock().await;

        let state = self.load(guild).await?;
        if !state.is_enabled() {
            return Err(CountingError::NotEnabled);
        }
        self.store.delete(guild).await.map_err(|e| {
            error!(guild = %guild, error = %e, "Failed to delete guild state");
            metrics::record_store_error(e.error_code());
            CountingError::from(e)
        })?;
        info!(guild = %guild, "Counting disabled");
        Ok(())
    }

    /// Append `{time, count}` to the history of every stored guild.
    ///
    /// Returns how many guilds were snapshotted. A failing guild is logged
    /// and skipped.
    pub async fn record_history(&self, time: i64) -> CountingResult<usize> {
        let guilds = self.store.keys().await.map_err(|e| {
            metrics::record_store_error(e.error_code());
            CountingError::from(e)
        })?;

        let mut recorded = 0;
        let mut enabled = 0;
        for guild in guilds {
            let result = self
                .modify(&guild, |state| {
                    Ok(vec![Mutation::PushHistory(HistoryPoint {
                        time,
                        count: state.count,
                    })])
                })
                .await;
            match result {
                Ok(state) => {
                    recorded += 1;
                    if state.is_enabled() {
                        enabled += 1;
                    }
                }
                Err(e) => warn!(guild = %guild, error = %e, "Failed to record count history"),
            }
        }
        metrics::set_enabled_guilds(enabled);
        Ok(recorded)
    }
}
