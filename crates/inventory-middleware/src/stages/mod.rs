//! Standard middleware stages.
//!
//! 1. [`request_id`] - Generate/propagate request ID
//! 2. [`telemetry`] - Access log and request metrics
//! 3. [`validation`] - Contract validation of parameters and body

pub mod request_id;
pub mod telemetry;
pub mod validation;

pub use request_id::RequestIdMiddleware;
pub use telemetry::TelemetryMiddleware;
pub use validation::ValidationMiddleware;
