//! # Inventory Middleware
//!
//! The request pipeline every routed request flows through.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → Telemetry → Validation → Handler
//!                                                   ↓
//! Response ← RequestId ← Telemetry ←────────────────┘
//! ```
//!
//! | Stage | Middleware         | Purpose                                      |
//! |-------|--------------------|----------------------------------------------|
//! | 1     | Request ID         | Generate/propagate request ID (UUID v7)      |
//! | 2     | Telemetry          | Emit access log and request metrics          |
//! | 3     | Request Validation | Validate parameters and body against contract |
//!
//! Telemetry wraps validation so rejected requests are still logged and
//! counted.
//!
//! ## Example
//!
//! ```
//! use inventory_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 3);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[2].name(), "request_validation");
//! ```

#![doc(html_root_url = "https://docs.rs/inventory-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use types::{Request, Response, ResponseExt};
