//! # Inventory Server
//!
//! HTTP server for the inventory item store.
//!
//! - [`InventoryService`] routes a request by the contract, runs the
//!   middleware pipeline and dispatches to the operation handler
//! - [`Server`] accepts HTTP/1.1 connections, serves `/health`, `/ready`
//!   and `/metrics`, and shuts down gracefully
//!
//! ## Example
//!
//! ```rust,no_run
//! use inventory_core::{inventory_contract, ItemStore};
//! use inventory_server::{InventoryService, Server, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let contract = Arc::new(inventory_contract()?);
//!     let service = InventoryService::new(contract, Arc::new(ItemStore::new()));
//!
//!     Server::builder(service)
//!         .config(ServerConfig::builder().http_addr("127.0.0.1:8080").build())
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/inventory-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod handler;
pub mod health;
pub mod router;
pub mod server;
pub mod service;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use handler::{HandlerError, HandlerRegistry, HandlerRequest, HandlerResponse, HandlerResult};
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerBuilder, ServerError};
pub use service::{InventoryService, InventoryServiceBuilder};
pub use shutdown::ShutdownSignal;
