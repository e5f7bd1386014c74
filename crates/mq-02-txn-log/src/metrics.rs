//! # Transaction Log Metrics
//!
//! Enable with the `metrics` feature:
//! ```toml
//! mq-02-txn-log = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `txnlog_conversions_total{kind,outcome}` - Conversions by transaction kind and outcome
//! - `txnlog_unresolved_messages_total` - Messages skipped because they were no longer live
//! - `txnlog_cleanup_failures_total` - Prepared copies that could not be removed

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Conversions, labeled by kind and outcome
    pub static ref CONVERSIONS: IntCounterVec = register_int_counter_vec!(
        "txnlog_conversions_total",
        "Total number of transaction log conversions",
        &["kind", "outcome"]
    )
    .expect("Failed to create CONVERSIONS metric");

    /// Unresolvable messages skipped during conversion
    pub static ref UNRESOLVED_MESSAGES: IntCounter = register_int_counter!(
        "txnlog_unresolved_messages_total",
        "Total number of messages skipped because they could not be found"
    )
    .expect("Failed to create UNRESOLVED_MESSAGES metric");

    /// Best-effort removals that failed
    pub static ref CLEANUP_FAILURES: IntCounter = register_int_counter!(
        "txnlog_cleanup_failures_total",
        "Total number of prepared message copies that could not be removed"
    )
    .expect("Failed to create CLEANUP_FAILURES metric");
}

/// Record a conversion outcome
#[cfg(feature = "metrics")]
pub fn record_conversion(kind: &str, outcome: &str) {
    CONVERSIONS.with_label_values(&[kind, outcome]).inc();
}

/// Record a skipped message
#[cfg(feature = "metrics")]
pub fn record_unresolved_message() {
    UNRESOLVED_MESSAGES.inc();
}

/// Record a failed removal
#[cfg(feature = "metrics")]
pub fn record_cleanup_failure() {
    CLEANUP_FAILURES.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_conversion(_kind: &str, _outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_unresolved_message() {}

#[cfg(not(feature = "metrics"))]
pub fn record_cleanup_failure() {}
