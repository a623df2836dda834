//! Prometheus metrics for the team connector.
//!
//! - Registry metrics (connected teams)
//! - Connection attempt metrics (by path and outcome)
//! - Credential purge metrics
//! - Plugin hook metrics

mod helpers;

pub use helpers::{encode_metrics, AttemptMetrics, HookMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_connector";

lazy_static! {
    // ============================================================================
    // Registry Metrics
    // ============================================================================

    /// Teams currently holding a live session
    pub static ref TEAMS_CONNECTED: IntGauge = register_int_gauge!(
        format!("{}_teams_connected", METRIC_PREFIX),
        "Number of teams with a live gateway session"
    ).unwrap();

    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Connection attempts by path (bootstrap, bot_created) and outcome
    pub static ref CONNECTION_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_connection_attempts_total", METRIC_PREFIX),
        "Total connection attempts",
        &["path", "outcome"]
    ).unwrap();

    /// Sessions whose automatic reconnection was exhausted
    pub static ref RECONNECT_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_reconnect_failed_total", METRIC_PREFIX),
        "Total reconnect-failed events handled"
    ).unwrap();

    // ============================================================================
    // Credential Metrics
    // ============================================================================

    pub static ref CREDENTIALS_PURGED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_credentials_purged_total", METRIC_PREFIX),
        "Total bot credentials removed after terminal auth failure"
    ).unwrap();

    /// Best-effort saves that failed and were dropped
    pub static ref STORE_SAVE_DROPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_purge_save_dropped_total", METRIC_PREFIX),
        "Total best-effort team saves dropped after a storage failure"
    ).unwrap();

    // ============================================================================
    // Hook Metrics
    // ============================================================================

    pub static ref PLUGIN_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_plugin_failures_total", METRIC_PREFIX),
        "Total plugin hook failures",
        &["plugin", "hook"]
    ).unwrap();

    pub static ref HOOK_DISPATCH_DURATION: HistogramVec = register_histogram_vec!(
        format!("{}_hook_dispatch_duration_seconds", METRIC_PREFIX),
        "Time spent dispatching a hook to all plugins",
        &["hook"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();
}
