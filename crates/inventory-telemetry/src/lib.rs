//! Observability for the inventory service.
//!
//! - **Logging**: structured JSON (or pretty) output via `tracing-subscriber`
//! - **Metrics**: Prometheus text format via the `metrics` facade
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `inventory_requests_total` | Counter | `operation`, `status` | Total request count |
//! | `inventory_request_duration_seconds` | Histogram | `operation` | Request latency |
//!
//! # Example
//!
//! ```rust,ignore
//! use inventory_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! init_logging(&LogConfig::default())?;
//! let registry = init_metrics(&MetricsConfig::default())?;
//!
//! // Later, from the /metrics endpoint:
//! let body = registry.map(|r| r.render());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, record_request, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
