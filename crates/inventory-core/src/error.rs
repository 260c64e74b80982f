//! Error types for the inventory service.
//!
//! Client errors are a missing identifier or a payload that does not parse.
//! The only server-side failure is running out of identifiers. Each maps to
//! an HTTP status and an [`ErrorBody`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::ItemId;

/// Result type alias using [`InventoryError`].
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors surfaced by store operations and API handlers.
///
/// # Example
///
/// ```
/// use inventory_core::InventoryError;
/// use http::StatusCode;
///
/// let err = InventoryError::not_found(42);
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(err.to_string(), "Could not find item with ID 42");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The requested identifier is not in the store.
    #[error("Could not find item with ID {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: ItemId,
    },

    /// The request payload or a parameter could not be parsed.
    #[error("{message}")]
    MalformedRequest {
        /// Human-readable error message.
        message: String,
    },

    /// Every identifier up to `ItemId::MAX` has been issued.
    #[error("No item ids left to assign")]
    IdsExhausted,
}

impl InventoryError {
    /// Creates a not found error for `id`.
    #[must_use]
    pub const fn not_found(id: ItemId) -> Self {
        Self::NotFound { id }
    }

    /// Creates a malformed request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            Self::IdsExhausted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts this error to the response body sent to clients.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.status_code(), self.to_string())
    }
}

/// The JSON error body returned by every failing endpoint.
///
/// `code` always equals the HTTP status of the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code.
    pub code: i32,

    /// Human-readable error message.
    pub message: String,
}

impl ErrorBody {
    /// Creates an error body for `status`.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: i32::from(status.as_u16()),
            message: message.into(),
        }
    }

    /// Serializes the body to JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"message":"Internal error"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = InventoryError::not_found(9999);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Could not find item with ID 9999");
    }

    #[test]
    fn test_malformed_error() {
        let err = InventoryError::malformed("Invalid format for NewItem");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid format for NewItem");
    }

    #[test]
    fn test_body_code_matches_status() {
        let body = InventoryError::not_found(1).to_body();
        assert_eq!(body.code, 404);

        let body = InventoryError::malformed("nope").to_body();
        assert_eq!(body.code, 400);
        assert_eq!(body.message, "nope");
    }

    #[test]
    fn test_ids_exhausted_is_server_error() {
        let body = InventoryError::IdsExhausted.to_body();
        assert_eq!(body.code, 500);
        assert_eq!(body.message, "No item ids left to assign");
    }

    #[test]
    fn test_body_json_matches_serde_shape() {
        let body = ErrorBody::new(StatusCode::BAD_REQUEST, "quote \" and \\ escaped");
        let parsed: ErrorBody = serde_json::from_str(&body.to_json()).unwrap();
        assert_eq!(parsed, body);
    }

    #[test]
    fn test_body_json_shape() {
        let json = ErrorBody::new(StatusCode::NOT_FOUND, "gone").to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"code": 404, "message": "gone"}));
    }
}
