//! Prometheus registry for the broker core.
//!
//! Broker-wide metrics follow the naming convention `mq_<area>_<metric>_<unit>`.
//! Subsystem crates register their own counters on the default registry
//! behind their `metrics` feature; [`encode_metrics`] exports both.

use lazy_static::lazy_static;
use prometheus::{exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use shared_types::Status;
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Broker core registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Errors surfaced to clients, by subsystem and reply status
    pub static ref SUBSYSTEM_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("mq_subsystem_errors_total", "Errors by subsystem and reply status"),
        &["subsystem", "status"]
    ).expect("metric creation failed");

    /// Duration of subsystem operations
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "mq_operation_duration_seconds",
            "Time spent in subsystem operations"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("valid buckets")),
        &["subsystem", "operation"]
    ).expect("metric creation failed");
}

/// Handle to the registry the broker core metrics live in.
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register the broker-wide metrics. Registering twice is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SUBSYSTEM_ERRORS.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Count an error reply sent by `subsystem`.
pub fn record_error(subsystem: &str, status: Status) {
    SUBSYSTEM_ERRORS
        .with_label_values(&[subsystem, &status.code().to_string()])
        .inc();
}

/// Encode broker core and subsystem metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut metric_families = REGISTRY.gather();
    metric_families.extend(prometheus::gather());
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: prometheus::Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start timing `operation` of `subsystem`.
    pub fn new(subsystem: &str, operation: &str) -> Self {
        Self {
            histogram: OPERATION_DURATION.with_label_values(&[subsystem, operation]),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing an operation. Observation happens on drop.
#[macro_export]
macro_rules! time_operation {
    ($subsystem:expr, $operation:expr) => {
        $crate::metrics::HistogramTimer::new($subsystem, $operation)
    };
}
