//! # Inventory Core
//!
//! Domain types for the inventory service.
//!
//! - [`Item`] / [`NewItem`] - The stored record and its create/update payload
//! - [`ItemStore`] - The lock-guarded in-memory collection and id counter
//! - [`InventoryError`] - The two failure kinds surfaced to callers
//! - [`Contract`] - The OpenAPI description of the service, used for routing
//!   and request validation
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/inventory-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contract;
mod error;
mod item;
mod request_id;
pub mod store;

pub use contract::{
    inventory_contract, is_json_media_type, Contract, ContractError, Operation, Parameter,
    ParameterLocation, RequestBody, Schema, ValidationError,
};
pub use error::{ErrorBody, InventoryError, InventoryResult};
pub use item::{Item, ItemId, NewItem};
pub use request_id::RequestId;
pub use store::{ItemFilter, ItemStore, DEFAULT_FIRST_ID};
