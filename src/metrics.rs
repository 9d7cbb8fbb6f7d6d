//! Prometheus metrics collection for tallyd.
//!
//! Exposed on the API listener at `/metrics`.
//!
//! - `tally_messages_evaluated_total{outcome}` - posts by verdict
//! - `tally_evaluation_duration_seconds` - evaluate + persist + effects
//! - `tally_resets_total{violation}` - counts reset to zero
//! - `tally_reposts_total` - deleted counts recreated
//! - `tally_backfill_total{outcome}` - catch-up scans by result
//! - `tally_gateway_errors_total{op}` - failed gateway calls
//! - `tally_store_errors_total{error}` - failed store operations
//! - `tally_api_requests_total{route,status}` - REST requests

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Evaluated counting posts by outcome (`accepted` or violation code).
pub static MESSAGES_EVALUATED: OnceLock<IntCounterVec> = OnceLock::new();

/// Counts reset to zero by the violation that caused them.
pub static RESETS: OnceLock<IntCounterVec> = OnceLock::new();

/// Deleted count messages recreated.
pub static REPOSTS: OnceLock<IntCounter> = OnceLock::new();

/// Backfill scans by outcome.
pub static BACKFILLS: OnceLock<IntCounterVec> = OnceLock::new();

/// Gateway calls that failed, by operation.
pub static GATEWAY_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Store operations that failed, by error code.
pub static STORE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// REST requests by route and status.
pub static API_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges and histograms
// ========================================================================

/// Guilds with the game enabled, refreshed by the snapshot task.
pub static ENABLED_GUILDS: OnceLock<IntGauge> = OnceLock::new();

/// Latency of handling one counting post.
pub static EVALUATION_LATENCY: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
/// Later calls are harmless: registration errors are logged and the first
/// instance of each metric wins.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(MESSAGES_EVALUATED, IntCounterVec::new(Opts::new("tally_messages_evaluated_total", "Counting posts evaluated by outcome"), &["outcome"]));
    register!(RESETS, IntCounterVec::new(Opts::new("tally_resets_total", "Counts reset to zero by violation"), &["violation"]));
    register!(REPOSTS, IntCounter::new("tally_reposts_total", "Deleted counts recreated"));
    register!(BACKFILLS, IntCounterVec::new(Opts::new("tally_backfill_total", "Backfill scans by outcome"), &["outcome"]));
    register!(GATEWAY_ERRORS, IntCounterVec::new(Opts::new("tally_gateway_errors_total", "Failed gateway calls by operation"), &["op"]));
    register!(STORE_ERRORS, IntCounterVec::new(Opts::new("tally_store_errors_total", "Failed store operations by error"), &["error"]));
    register!(API_REQUESTS, IntCounterVec::new(Opts::new("tally_api_requests_total", "REST requests by route and status"), &["route", "status"]));
    register!(ENABLED_GUILDS, IntGauge::new("tally_enabled_guilds", "Guilds with the counting game enabled"));
    register!(EVALUATION_LATENCY, Histogram::with_opts(
        HistogramOpts::new("tally_evaluation_duration_seconds", "Latency of handling one counting post")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

fn inc_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

/// Record one evaluated post and how long it took.
#[inline]
pub fn record_evaluation(outcome: &str, duration_secs: f64) {
    inc_vec(&MESSAGES_EVALUATED, &[outcome]);
    if let Some(h) = EVALUATION_LATENCY.get() {
        h.observe(duration_secs);
    }
}

/// Record a count reset.
#[inline]
pub fn record_reset(violation: &str) {
    inc_vec(&RESETS, &[violation]);
}

/// Record a recreated count message.
#[inline]
pub fn record_repost() {
    if let Some(c) = REPOSTS.get() {
        c.inc();
    }
}

/// Record a backfill scan result.
#[inline]
pub fn record_backfill(outcome: &str) {
    inc_vec(&BACKFILLS, &[outcome]);
}

/// Record a failed gateway call.
#[inline]
pub fn record_gateway_error(op: &str) {
    inc_vec(&GATEWAY_ERRORS, &[op]);
}

/// Record a failed store operation.
#[inline]
pub fn record_store_error(error: &str) {
    inc_vec(&STORE_ERRORS, &[error]);
}

/// Record a REST request.
#[inline]
pub fn record_api_request(route: &str, status: u16) {
    inc_vec(&API_REQUESTS, &[route, &status.to_string()]);
}

/// Set the enabled guild gauge.
#[inline]
pub fn set_enabled_guilds(count: usize) {
    if let Some(g) = ENABLED_GUILDS.get() {
        g.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        // Safe to call more than once; the first registration wins.
        init();
        init();

        record_evaluation("accepted", 0.001);
        record_reset("wrong_value");
        record_api_request("/servers", 200);

        let output = gather_metrics();
        assert!(output.contains("tally_messages_evaluated_total"));
        assert!(output.contains("tally_api_requests_total"));
    }
}
