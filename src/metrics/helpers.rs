//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{CONNECTION_ATTEMPTS_TOTAL, HOOK_DISPATCH_DURATION, PLUGIN_FAILURES_TOTAL};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording connection attempt metrics
pub struct AttemptMetrics;

impl AttemptMetrics {
    pub fn record(path: &str, outcome: &str) {
        CONNECTION_ATTEMPTS_TOTAL
            .with_label_values(&[path, outcome])
            .inc();
    }
}

/// Helper struct for recording hook dispatch metrics
pub struct HookMetrics;

impl HookMetrics {
    pub fn record_failure(plugin: &str, hook: &str) {
        PLUGIN_FAILURES_TOTAL.with_label_values(&[plugin, hook]).inc();
    }

    pub fn record_dispatch(hook: &str, elapsed: Duration) {
        HOOK_DISPATCH_DURATION
            .with_label_values(&[hook])
            .observe(elapsed.as_secs_f64());
    }
}
