//! # Cluster Sync Metrics
//!
//! Enable with the `metrics` feature:
//! ```toml
//! mq-03-cluster-sync = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `mbwaiter_requests_queued_total` - Requests parked to wait for master broker sync
//! - `mbwaiter_requests_resolved_total{outcome}` - Parked requests by outcome (retry, error, dropped)
//! - `mbwaiter_pending` - Requests currently parked

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Requests queued
    pub static ref REQUESTS_QUEUED: IntCounter = register_int_counter!(
        "mbwaiter_requests_queued_total",
        "Total number of requests queued to wait for master broker sync"
    )
    .expect("Failed to create REQUESTS_QUEUED metric");

    /// Requests resolved, labeled by outcome
    pub static ref REQUESTS_RESOLVED: IntCounterVec = register_int_counter_vec!(
        "mbwaiter_requests_resolved_total",
        "Total number of parked requests resolved",
        &["outcome"]
    )
    .expect("Failed to create REQUESTS_RESOLVED metric");

    /// Requests currently waiting
    pub static ref PENDING: IntGauge = register_int_gauge!(
        "mbwaiter_pending",
        "Number of requests waiting for master broker sync"
    )
    .expect("Failed to create PENDING metric");
}

/// Record a queued request
#[cfg(feature = "metrics")]
pub fn record_queued() {
    REQUESTS_QUEUED.inc();
}

/// Record a resolved request
#[cfg(feature = "metrics")]
pub fn record_resolved(outcome: &str) {
    REQUESTS_RESOLVED.with_label_values(&[outcome]).inc();
}

/// Set the number of waiting requests
#[cfg(feature = "metrics")]
pub fn set_pending(count: usize) {
    PENDING.set(i64::try_from(count).unwrap_or(i64::MAX));
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_queued() {}

#[cfg(not(feature = "metrics"))]
pub fn record_resolved(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending(_count: usize) {}
