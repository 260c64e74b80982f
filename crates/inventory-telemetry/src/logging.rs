//! Log output for the inventory service.
//!
//! One global `tracing` subscriber: an [`EnvFilter`] built from
//! [`LogConfig::level`] in front of a JSON or pretty formatter. Call
//! [`init_logging`] once at startup.
//!
//! ```rust,ignore
//! use inventory_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(operation_id = "findItems", "request served");
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `false` leaves the global subscriber untouched.
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `info` or `inventory_server=debug,hyper=warn`.
    pub level: String,

    /// One JSON object per event instead of the multi-line pretty format.
    pub json_format: bool,

    /// Attach source file and line to each event.
    pub file_line_info: bool,

    /// Attach the module path to each event.
    pub include_target: bool,
}

impl LogConfig {
    /// Pretty, `debug`-level output with source locations, for local runs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON, `info`-level output for log shippers.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            ..Self::development()
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::LoggingInit`] for an unparseable `level` or when
/// another global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = parse_filter(&config.level)?;
    let fmt = tracing_subscriber::fmt::layer()
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);
    let output = if config.json_format {
        fmt.json().boxed()
    } else {
        fmt.pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn parse_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| {
        TelemetryError::LoggingInit(format!("invalid log filter '{directive}': {e}"))
    })
}
