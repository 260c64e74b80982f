//! HTTP types used throughout the pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use inventory_core::ErrorBody;

/// The HTTP request type used in the middleware pipeline.
///
/// The body is fully buffered by the server before the pipeline runs.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Content type of every JSON body the service sends.
pub const APPLICATION_JSON: &str = "application/json";

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a response with a JSON body.
    fn json(status: StatusCode, body: impl Into<Bytes>) -> Response;

    /// Creates a response with no body.
    fn empty(status: StatusCode) -> Response;

    /// Creates an error response carrying `body`.
    ///
    /// The HTTP status is taken from `body.code`.
    fn error_body(body: &ErrorBody) -> Response;
}

impl ResponseExt for Response {
    fn json(status: StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = http::Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        response
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn error_body(body: &ErrorBody) -> Response {
        let status = u16::try_from(body.code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::json(status, body.to_json())
    }
}
