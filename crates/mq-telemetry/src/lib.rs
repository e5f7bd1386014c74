//! # mq-telemetry
//!
//! Logging, span export and Prometheus metrics for the broker core.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mq_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).await.expect("Failed to init telemetry");
//!     // broker runs here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` | OTLP collector (`otlp` feature) |
//! | `OTEL_SERVICE_NAME` | `mq-broker` | Service name in logs and traces |
//! | `MQ_BROKER_ID` | empty | Broker instance id |
//! | `MQ_LOG_LEVEL` | `info` | Log level filter |
//! | `MQ_JSON_LOGS` | `false` | JSON log lines |
//! | `MQ_CONSOLE_OUTPUT` | `true` | Log to stdout |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod logging;
pub mod metrics;
#[cfg(feature = "otlp")]
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, record_error, register_metrics, HistogramTimer, MetricsHandle};
#[cfg(feature = "otlp")]
pub use tracing_setup::TracingGuard;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and the global subscriber.
///
/// Returns a guard that must be held for the lifetime of the broker. With
/// the `otlp` feature, dropping it flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;

    #[cfg(feature = "otlp")]
    let tracing = tracing_setup::init_tracing(&config).await?;
    #[cfg(not(feature = "otlp"))]
    init_logging(&config)?;

    Ok(TelemetryGuard {
        #[cfg(feature = "otlp")]
        _tracing: tracing,
        metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    #[cfg(feature = "otlp")]
    _tracing: TracingGuard,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Span carrying the subsystem tag.
///
/// ```rust,ignore
/// let _span = mq_telemetry::subsystem_span!("convert", subsystem = "mq-02", tid = %tid).entered();
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        $crate::__private::tracing::info_span!($name, $($field)*)
    };
}
