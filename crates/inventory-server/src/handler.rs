//! Handler registration and dispatch.
//!
//! Each contract operation is served by one async handler registered under
//! its `operationId`. A handler receives the raw pieces of the request
//! (path parameters, query pairs, body bytes) and returns a status with an
//! optional JSON body, or an error that the service renders as an
//! `{"code", "message"}` body.
//!
//! # Example
//!
//! ```rust
//! use inventory_server::handler::{HandlerRegistry, HandlerRequest, HandlerResponse};
//! use http::StatusCode;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("ping", |_req: HandlerRequest| async {
//!     Ok(HandlerResponse::no_content())
//! });
//!
//! assert!(registry.contains("ping"));
//! assert_eq!(registry.len(), 1);
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use inventory_core::{ErrorBody, InventoryError};
use inventory_middleware::BoxFuture;
use serde::Serialize;
use thiserror::Error;

/// Result type returned by handlers.
pub type HandlerResult = Result<HandlerResponse, HandlerError>;

/// A type-erased handler function.
pub type ErasedHandler = Arc<dyn Fn(HandlerRequest) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Handler error type.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The store or the handler rejected the request.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Response serialization failed.
    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HandlerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Inventory(e) => e.status_code(),
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts this error to the response body sent to clients.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::Inventory(e) => e.to_body(),
            Self::Serialization(_) => ErrorBody::new(self.status_code(), self.to_string()),
        }
    }
}

/// The request as seen by a handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerRequest {
    params: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Bytes,
}

impl HandlerRequest {
    /// Creates a handler request from its parts.
    #[must_use]
    pub fn new(params: HashMap<String, String>, query: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            params,
            query,
            body,
        }
    }

    /// Parses a raw query string into the pairs handlers see.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::MalformedRequest`] if the query string is
    /// not valid `application/x-www-form-urlencoded` text.
    pub fn parse_query(query: Option<&str>) -> Result<Vec<(String, String)>, InventoryError> {
        match query {
            Some(q) => serde_urlencoded::from_str(q)
                .map_err(|_| InventoryError::malformed("Invalid format for query string")),
            None => Ok(Vec::new()),
        }
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns every value given for a query parameter, in request order.
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns the first value given for a query parameter.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// A successful handler outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    status: StatusCode,
    body: Option<Bytes>,
}

impl HandlerResponse {
    /// Creates a response whose body is `value` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Serialization`] if `value` cannot be
    /// serialized.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> HandlerResult {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self {
            status,
            body: Some(Bytes::from(bytes)),
        })
    }

    /// Creates a `204 No Content` response.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Consumes the response, returning its status and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Option<Bytes>) {
        (self.status, self.body)
    }
}

/// Registry mapping operation IDs to handlers.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ErasedHandler>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("HandlerRegistry")
            .field("operations", &ids)
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for an operation, replacing any previous one.
    pub fn register<F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let erased: ErasedHandler =
            Arc::new(move |request| -> BoxFuture<'static, HandlerResult> {
                Box::pin(handler(request))
            });
        self.handlers.insert(operation_id.into(), erased);
    }

    /// Returns the handler for an operation.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<ErasedHandler> {
        self.handlers.get(operation_id).cloned()
    }

    /// Checks if a handler is registered for an operation.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
