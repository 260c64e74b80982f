//! Typed configuration for the inventory service.
//!
//! - TOML and JSON configuration files
//! - `.env` files and `INVENTORY__SECTION__KEY` environment overrides
//! - Strict parsing (unknown fields are rejected)
//! - Layered loading (defaults → file → env → validation)
//!
//! # Example
//!
//! ```no_run
//! use inventory_config::ConfigLoader;
//!
//! # fn main() -> Result<(), inventory_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("inventory.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("INVENTORY")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! header_read_timeout_secs = 60
//!
//! [store]
//! first_id = 1000
//!
//! [contract]
//! validate_requests = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::InventoryConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    ContractConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig, StoreConfig,
};
