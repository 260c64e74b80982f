//! Telemetry middleware.
//!
//! Logs one structured line per request on completion and records
//! `inventory_requests_total` and `inventory_request_duration_seconds`.
//! Requests that matched no operation are labelled `unmatched`.

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response},
};
use std::time::Instant;

/// Operation label used when routing resolved no operation.
pub const UNMATCHED_OPERATION: &str = "unmatched";

/// Telemetry middleware that emits metrics and an access log.
#[derive(Debug, Clone)]
pub struct TelemetryMiddleware {
    record_metrics: bool,
}

/// What the telemetry stage observed about a completed request.
///
/// Stored in the context as an extension after each request.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    /// The operation ID, or [`UNMATCHED_OPERATION`].
    pub operation_id: String,
    /// The HTTP method.
    pub method: String,
    /// The request path.
    pub path: String,
    /// The HTTP status code.
    pub status_code: u16,
    /// Request duration in milliseconds.
    pub duration_ms: f64,
    /// The request ID.
    pub request_id: String,
}

impl TelemetryMiddleware {
    /// Creates a telemetry middleware that logs and records metrics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            record_metrics: true,
        }
    }

    /// Creates a telemetry middleware that only logs.
    #[must_use]
    pub fn logs_only() -> Self {
        Self {
            record_metrics: false,
        }
    }

    fn emit(&self, data: &TelemetryData, duration: std::time::Duration) {
        if self.record_metrics {
            inventory_telemetry::record_request(&data.operation_id, data.status_code, duration);
        }

        if data.status_code >= 500 {
            tracing::error!(
                request_id = %data.request_id,
                operation_id = %data.operation_id,
                http.method = %data.method,
                http.path = %data.path,
                http.status_code = data.status_code,
                duration_ms = data.duration_ms,
                "request failed"
            );
        } else {
            tracing::info!(
                request_id = %data.request_id,
                operation_id = %data.operation_id,
                http.method = %data.method,
                http.path = %data.path,
                http.status_code = data.status_code,
                duration_ms = data.duration_ms,
                "request completed"
            );
        }
    }
}

impl Default for TelemetryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let path = request.uri().path().to_string();

            let response = next.run(ctx, request).await;

            let duration = start.elapsed();
            let data = TelemetryData {
                operation_id: ctx
                    .operation_id()
                    .unwrap_or(UNMATCHED_OPERATION)
                    .to_string(),
                method,
                path,
                status_code: response.status().as_u16(),
                duration_ms: duration.as_secs_f64() * 1000.0,
                request_id: ctx.request_id().to_string(),
            };

            self.emit(&data, duration);
            ctx.set_extension(data);

            response
        })
    }
}
