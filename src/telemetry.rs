//! Telemetry utilities for evaluation timing and event spans.

use std::time::Instant;

/// Guard for timing the handling of one counting post.
///
/// Records the latency and outcome when dropped. A guard dropped before
/// [`EvaluationTimer::outcome`] is called records `error`, which covers
/// early returns through `?`.
pub struct EvaluationTimer {
    outcome: &'static str,
    start: Instant,
}

impl EvaluationTimer {
    /// Start timing.
    pub fn start() -> Self {
        Self {
            outcome: "error",
            start: Instant::now(),
        }
    }

    /// Set the outcome label recorded on drop.
    pub fn outcome(&mut self, outcome: &'static str) {
        self.outcome = outcome;
    }
}

impl Drop for EvaluationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_evaluation(self.outcome, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one gateway event in a guild.
    pub fn guild_event(kind: &str, guild: &str, channel: &str, message: &str) -> Span {
        info_span!("event", kind = %kind, guild = %guild, channel = %channel, message = %message)
    }

    /// Span for an operator command.
    pub fn command(name: &str, guild: &str) -> Span {
        info_span!("command", name = %name, guild = %guild)
    }
}
