//! Performing engine effects against the gateway.
//!
//! Effects run after the state batch is persisted. A failed call is logged
//! and counted; the remaining effects still run.

use crate::gateway::{ChannelOps, GatewayError};
use crate::metrics;
use tally_core::{Effect, PIN_CAP};
use tracing::warn;

/// Apply a list of effects sequentially.
pub async fn apply_effects(ops: &dyn ChannelOps, channel: &str, effects: &[Effect]) {
    for effect in effects {
        apply_effect(ops, channel, effect).await;
    }
}

async fn apply_effect(ops: &dyn ChannelOps, channel: &str, effect: &Effect) {
    match effect {
        Effect::React {
            message_id,
            reaction,
        } => {
            let result = ops.react(channel, message_id, *reaction).await;
            report("react", channel, result);
        }
        Effect::Delete { message_id } => {
            let result = ops.delete(channel, message_id).await;
            report("delete", channel, result);
        }
        Effect::Announce(notice) => {
            let result = ops.send(channel, notice.to_outgoing()).await;
            report("send", channel, result);
        }
        Effect::PinMilestone { message_id } => {
            pin_with_cap(ops, channel, message_id).await;
        }
    }
}

/// Pin `message`, first unpinning the oldest pin when the channel is full.
pub(crate) async fn pin_with_cap(ops: &dyn ChannelOps, channel: &str, message: &str) {
    let Some(pinned) = report("fetch_pinned", channel, ops.fetch_pinned(channel).await) else {
        return;
    };
    if pinned.len() >= PIN_CAP
        && let Some(oldest) = pinned.first()
    {
        report("unpin", channel, ops.unpin(channel, oldest).await);
    }
    report("pin", channel, ops.pin(channel, message).await);
}

fn report<T>(op: &'static str, channel: &str, result: Result<T, GatewayError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(op, channel = %channel, error = %e, code = e.error_code(), "Gateway call failed");
            metrics::record_gateway_error(op);
            None
        }
    }
}
