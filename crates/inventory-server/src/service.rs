//! The inventory HTTP service, independent of any socket.
//!
//! [`InventoryService::handle`] takes a fully buffered request through
//! routing, the middleware pipeline and the operation handler:
//!
//! ```text
//! Request → Router ─┬─ matched ──→ Pipeline → Handler
//!                   └─ unmatched → Pipeline → 404 / 405
//! ```
//!
//! Unmatched requests still pass the pipeline so they get a request id and
//! an access log line.

use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use inventory_core::{Contract, ErrorBody, ItemStore};
use inventory_middleware::{
    stages::{RequestIdMiddleware, TelemetryMiddleware, ValidationMiddleware},
    BoxFuture, MiddlewareContext, Pipeline, Request, Response, ResponseExt,
};

use crate::api;
use crate::handler::{ErasedHandler, HandlerRegistry, HandlerRequest};
use crate::router::Router;

/// Routes, validates and dispatches inventory requests.
///
/// # Example
///
/// ```rust
/// use inventory_core::{inventory_contract, ItemStore};
/// use inventory_server::InventoryService;
/// use std::sync::Arc;
///
/// let contract = Arc::new(inventory_contract().unwrap());
/// let service = InventoryService::builder(contract, Arc::new(ItemStore::new()))
///     .validate_requests(false)
///     .build();
///
/// assert_eq!(service.pipeline().stage_count(), 2);
/// ```
#[derive(Debug)]
pub struct InventoryService {
    router: Router,
    handlers: HandlerRegistry,
    pipeline: Pipeline,
}

enum Dispatch {
    Operation {
        operation_id: String,
        handler: Option<ErasedHandler>,
    },
    Unrouted {
        path: String,
        allowed: Vec<Method>,
    },
}

impl InventoryService {
    /// Creates a service with request validation and metrics enabled.
    #[must_use]
    pub fn new(contract: Arc<Contract>, store: Arc<ItemStore>) -> Self {
        Self::builder(contract, store).build()
    }

    /// Creates a builder serving `contract` from `store`.
    #[must_use]
    pub fn builder(contract: Arc<Contract>, store: Arc<ItemStore>) -> InventoryServiceBuilder {
        InventoryServiceBuilder::new(contract, store)
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Returns the middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handles one request end to end.
    pub async fn handle(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();

        let (ctx, dispatch) = match self.router.match_route(request.method(), &path) {
            Some(route) => {
                let handler = self.handlers.get(route.operation_id());
                let (operation_id, params) = route.into_parts();
                (
                    MiddlewareContext::routed(operation_id.clone(), params),
                    Dispatch::Operation {
                        operation_id,
                        handler,
                    },
                )
            }
            None => {
                let allowed = self.router.allowed_methods(&path);
                (MiddlewareContext::new(), Dispatch::Unrouted { path, allowed })
            }
        };

        self.pipeline
            .process(ctx, request, move |ctx, request| dispatch.run(ctx, request))
            .await
    }
}

impl Dispatch {
    fn run(self, ctx: &mut MiddlewareContext, request: Request) -> BoxFuture<'static, Response> {
        match self {
            Self::Operation {
                operation_id,
                handler,
            } => {
                let params = ctx.path_params().clone();
                let query = request.uri().query().map(str::to_string);
                Box::pin(async move {
                    let Some(handler) = handler else {
                        tracing::warn!(operation_id = %operation_id, "no handler registered");
                        return Response::error_body(&ErrorBody::new(
                            StatusCode::NOT_IMPLEMENTED,
                            format!("No handler registered for operation: {operation_id}"),
                        ));
                    };

                    let query = match HandlerRequest::parse_query(query.as_deref()) {
                        Ok(query) => query,
                        Err(e) => return Response::error_body(&e.to_body()),
                    };
                    let body = request
                        .into_body()
                        .collect()
                        .await
                        .unwrap_or_else(|never| match never {})
                        .to_bytes();

                    match handler(HandlerRequest::new(params, query, body)).await {
                        Ok(response) => match response.into_parts() {
                            (status, Some(body)) => Response::json(status, body),
                            (status, None) => Response::empty(status),
                        },
                        Err(e) => {
                            tracing::debug!(operation_id = %operation_id, error = %e, "operation failed");
                            Response::error_body(&e.to_body())
                        }
                    }
                })
            }
            Self::Unrouted { path, allowed } => Box::pin(async move {
                if allowed.is_empty() {
                    return Response::error_body(&ErrorBody::new(
                        StatusCode::NOT_FOUND,
                        format!("No operation matches path {path}"),
                    ));
                }

                let method = request.method().clone();
                let mut response = Response::error_body(&ErrorBody::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("Method {method} is not allowed on {path}"),
                ));
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }),
        }
    }
}

/// Builder for [`InventoryService`].
#[derive(Debug)]
pub struct InventoryServiceBuilder {
    contract: Arc<Contract>,
    store: Arc<ItemStore>,
    validate_requests: bool,
    record_metrics: bool,
    trust_request_ids: bool,
}

impl InventoryServiceBuilder {
    /// Creates a builder with validation and metrics enabled.
    #[must_use]
    pub fn new(contract: Arc<Contract>, store: Arc<ItemStore>) -> Self {
        Self {
            contract,
            store,
            validate_requests: true,
            record_metrics: true,
            trust_request_ids: false,
        }
    }

    /// Enables or disables contract validation of requests.
    #[must_use]
    pub fn validate_requests(mut self, enabled: bool) -> Self {
        self.validate_requests = enabled;
        self
    }

    /// Enables or disables request metrics.
    #[must_use]
    pub fn record_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = enabled;
        self
    }

    /// Reuses valid incoming `x-request-id` headers instead of minting new ids.
    #[must_use]
    pub fn trust_request_ids(mut self, enabled: bool) -> Self {
        self.trust_request_ids = enabled;
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> InventoryService {
        let router = Router::from_contract(&self.contract);

        let mut handlers = HandlerRegistry::new();
        api::register(&mut handlers, &self.store);

        let request_id = if self.trust_request_ids {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };
        let telemetry = if self.record_metrics {
            TelemetryMiddleware::new()
        } else {
            TelemetryMiddleware::logs_only()
        };

        let mut pipeline = Pipeline::builder().add_stage(request_id).add_stage(telemetry);
        if self.validate_requests {
            pipeline = pipeline.add_stage(ValidationMiddleware::new(self.contract));
        }

        InventoryService {
            router,
            handlers,
            pipeline: pipeline.build(),
        }
    }
}
