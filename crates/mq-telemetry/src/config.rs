//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging, tracing and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// Broker instance identifier, empty for a standalone broker
    pub broker_id: String,

    /// OTLP collector endpoint (used with the `otlp` feature)
    pub otlp_endpoint: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output (for development)
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Prometheus metrics port
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "mq-broker".to_string(),
            broker_id: String::new(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: mq-broker)
    /// - `MQ_BROKER_ID`: Broker instance id (default: empty)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint (default: http://localhost:4317)
    /// - `MQ_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `MQ_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `MQ_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `MQ_METRICS_PORT`: Prometheus metrics port (default: 9100)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),

            broker_id: env::var("MQ_BROKER_ID").unwrap_or_default(),

            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(defaults.otlp_endpoint),

            log_level: env::var("MQ_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env::var("MQ_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("MQ_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("MQ_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),
        }
    }

    /// Configuration for one broker of a cluster.
    pub fn for_broker(broker_id: &str) -> Self {
        let mut config = Self::from_env();
        config.broker_id = broker_id.to_string();
        config
    }

    /// Service name including the broker id, if any.
    pub fn full_service_name(&self) -> String {
        if self.broker_id.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.broker_id)
        }
    }
}
