//! Prometheus metrics for the inventory service.
//!
//! Metrics are recorded through the `metrics` facade and rendered in
//! Prometheus text format by a [`MetricsRegistry`], which the server exposes
//! at `GET /metrics`.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `inventory_requests_total` | Counter | `operation`, `status` | Total requests |
//! | `inventory_request_duration_seconds` | Histogram | `operation` | Request latency |

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Name of the request counter.
pub const REQUESTS_TOTAL: &str = "inventory_requests_total";

/// Name of the request duration histogram.
pub const REQUEST_DURATION_SECONDS: &str = "inventory_request_duration_seconds";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Renders recorded metrics in Prometheus text format.
///
/// Cheap to clone; every clone renders the same recorder.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Creates a registry around an existing handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Builds a recorder that is not installed globally.
    ///
    /// Useful in tests, paired with [`metrics::with_local_recorder`].
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::MetricsInit` if the bucket layout is invalid.
    pub fn detached(config: &MetricsConfig) -> TelemetryResult<(PrometheusRecorder, Self)> {
        let recorder = builder(config)?.build_recorder();
        let registry = Self::new(recorder.handle());
        Ok((recorder, registry))
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.run_upkeep();
        self.handle.render()
    }
}

/// Installs the global Prometheus recorder.
///
/// Returns `Ok(None)` when metrics are disabled.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the bucket layout is invalid or a
/// global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = builder(config)?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();

    Ok(Some(MetricsRegistry::new(handle)))
}

fn builder(config: &MetricsConfig) -> TelemetryResult<PrometheusBuilder> {
    let builder = PrometheusBuilder::new();
    if config.duration_buckets.is_empty() {
        return Ok(builder);
    }

    builder
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
}

/// Records a completed request.
///
/// Increments `inventory_requests_total` and observes
/// `inventory_request_duration_seconds`.
pub fn record_request(operation: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}
