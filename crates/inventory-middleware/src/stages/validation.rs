//! Contract validation middleware.
//!
//! Checks a routed request against the operation the contract declares for
//! it, before the handler runs:
//!
//! - path parameters parse as their declared type
//! - declared query parameters parse, repeated keys fill array parameters,
//!   and required ones are present
//! - a declared JSON body is present when required, is sent as JSON, parses,
//!   and conforms to its schema
//!
//! The first violation short-circuits the pipeline with a 400 and an
//! `{"code", "message"}` body. Requests that matched no operation pass
//! through untouched.

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response, ResponseExt},
};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use inventory_core::{
    is_json_media_type, Contract, ErrorBody, Operation, ParameterLocation, Schema,
};
use serde_json::Value;
use std::sync::Arc;

/// Request validation middleware.
#[derive(Clone)]
pub struct ValidationMiddleware {
    mode: ValidationMode,
}

#[derive(Clone)]
enum ValidationMode {
    AllowAll,
    Contract(Arc<Contract>),
}

impl std::fmt::Debug for ValidationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            ValidationMode::AllowAll => "allow_all",
            ValidationMode::Contract(_) => "contract",
        };
        f.debug_struct("ValidationMiddleware")
            .field("mode", &mode)
            .finish()
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRejection {
    /// The message sent to the client.
    pub message: String,
}

impl RequestRejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn parameter(name: &str, location: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "parameter \"{name}\" in {location} has an error: {reason}"
        ))
    }

    fn body(reason: impl std::fmt::Display) -> Self {
        Self::new(format!("request body has an error: {reason}"))
    }
}

impl ValidationMiddleware {
    /// Validates requests against `contract`.
    #[must_use]
    pub fn new(contract: Arc<Contract>) -> Self {
        Self {
            mode: ValidationMode::Contract(contract),
        }
    }

    /// Accepts every request.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            mode: ValidationMode::AllowAll,
        }
    }

    /// Returns `true` if requests are checked against a contract.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, ValidationMode::Contract(_))
    }

    fn validate_path(
        operation: &Operation,
        ctx: &MiddlewareContext,
    ) -> Result<(), RequestRejection> {
        for param in operation.parameters_in(ParameterLocation::Path) {
            let raw = ctx
                .path_param(&param.name)
                .ok_or_else(|| RequestRejection::parameter(&param.name, "path", "value is required"))?;

            param
                .schema
                .parse_param(raw, &param.name)
                .map_err(|e| RequestRejection::parameter(&param.name, "path", e.message))?;
        }
        Ok(())
    }

    fn validate_query(operation: &Operation, query: Option<&str>) -> Result<(), RequestRejection> {
        let pairs: Vec<(String, String)> = match query {
            Some(q) => serde_urlencoded::from_str(q)
                .map_err(|e| RequestRejection::new(format!("invalid query string: {e}")))?,
            None => Vec::new(),
        };

        for param in operation.parameters_in(ParameterLocation::Query) {
            let values: Vec<&str> = pairs
                .iter()
                .filter(|(k, _)| *k == param.name)
                .map(|(_, v)| v.as_str())
                .collect();

            if values.is_empty() {
                if param.required {
                    return Err(RequestRejection::parameter(
                        &param.name,
                        "query",
                        "value is required",
                    ));
                }
                continue;
            }

            match &param.schema {
                Schema::Array { items } => {
                    for value in values {
                        items
                            .parse_param(value, &param.name)
                            .map_err(|e| RequestRejection::parameter(&param.name, "query", e.message))?;
                    }
                }
                scalar => {
                    if values.len() > 1 {
                        return Err(RequestRejection::parameter(
                            &param.name,
                            "query",
                            "expected a single value",
                        ));
                    }
                    scalar
                        .parse_param(values[0], &param.name)
                        .map_err(|e| RequestRejection::parameter(&param.name, "query", e.message))?;
                }
            }
        }
        Ok(())
    }

    fn validate_body(
        operation: &Operation,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<(), RequestRejection> {
        let Some(declared) = operation.request_body() else {
            return Ok(());
        };

        if body.is_empty() {
            return if declared.required {
                Err(RequestRejection::body("value is required"))
            } else {
                Ok(())
            };
        }

        match content_type {
            Some(ct) if is_json_media_type(ct) => {}
            Some(ct) => {
                return Err(RequestRejection::body(format!(
                    "unsupported content type \"{ct}\""
                )))
            }
            None => return Err(RequestRejection::body("missing content type")),
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RequestRejection::body(format!("invalid JSON: {e}")))?;

        declared
            .schema
            .validate(&value)
            .map_err(|e| RequestRejection::body(format!("{}: {}", e.path, e.message)))
    }

    async fn validate(
        &self,
        ctx: &MiddlewareContext,
        request: Request,
    ) -> (Request, Result<(), RequestRejection>) {
        let ValidationMode::Contract(contract) = &self.mode else {
            return (request, Ok(()));
        };
        let Some(operation) = ctx.operation_id().and_then(|id| contract.get_operation(id)) else {
            return (request, Ok(()));
        };

        if let Err(rejection) = Self::validate_path(operation, ctx)
            .and_then(|()| Self::validate_query(operation, request.uri().query()))
        {
            return (request, Err(rejection));
        }

        if operation.request_body().is_none() {
            return (request, Ok(()));
        }

        let (parts, body) = request.into_parts();
        let bytes: Bytes = body
            .collect()
            .await
            .unwrap_or_else(|never| match never {})
            .to_bytes();

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let result = Self::validate_body(operation, content_type, &bytes);

        (Request::from_parts(parts, Full::new(bytes)), result)
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "request_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (request, result) = self.validate(ctx, request).await;

            if let Err(rejection) = result {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    operation_id = ctx.operation_id().unwrap_or_default(),
                    reason = %rejection.message,
                    "request rejected by contract"
                );
                let body = ErrorBody::new(StatusCode::BAD_REQUEST, rejection.message.clone());
                ctx.set_extension(rejection);
                return Response::error_body(&body);
            }

            next.run(ctx, request).await
        })
    }
}
