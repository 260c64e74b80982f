//! HTTP server implementation.
//!
//! Accepts HTTP/1.1 connections on a tokio listener, answers the built-in
//! `/health`, `/ready` and `/metrics` endpoints directly, and hands every
//! other request to the [`InventoryService`].
//!
//! # Example
//!
//! ```rust,ignore
//! use inventory_server::{InventoryService, Server, ServerConfig};
//!
//! let server = Server::builder(service)
//!     .config(ServerConfig::builder().http_addr("0.0.0.0:8080").build())
//!     .build();
//!
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use inventory_core::{ErrorBody, RequestId};
use inventory_middleware::stages::request_id::REQUEST_ID_HEADER;
use inventory_middleware::{Request, Response, ResponseExt};
use inventory_telemetry::MetricsRegistry;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::health::{HealthCheck, ReadinessCheck};
use crate::service::InventoryService;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Content type of the Prometheus text exposition format.
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("Invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// The parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind to the configured address.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The inventory HTTP server.
pub struct Server {
    config: ServerConfig,
    service: InventoryService,
    health: HealthCheck,
    readiness: ReadinessCheck,
    metrics: Option<MetricsRegistry>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("service", &self.service)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server builder around `service`.
    #[must_use]
    pub fn builder(service: InventoryService) -> ServerBuilder {
        ServerBuilder::new(service)
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the health check handler.
    #[must_use]
    pub fn health(&self) -> &HealthCheck {
        &self.health
    }

    /// Returns the readiness check handler.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// Binds the configured address and serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for them to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, "server listening"),
            Err(e) => tracing::warn!(error = %e, "server listening on unknown address"),
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::debug!(%remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        server.readiness.set_ready(false);

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout = ?shutdown_timeout,
            active = tracker.active_connections(),
            "waiting for connections to close"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(shutdown_timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.header_read_timeout());

        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles a single HTTP request.
    async fn handle_request(&self, req: http::Request<Incoming>) -> Response {
        let mut response = self.dispatch(req).await;

        if !response.headers().contains_key(REQUEST_ID_HEADER) {
            if let Ok(value) = HeaderValue::from_str(&RequestId::new().to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
        }
        response
    }

    async fn dispatch(&self, req: http::Request<Incoming>) -> Response {
        if req.method() == Method::GET {
            match req.uri().path() {
                "/health" => return self.handle_health(),
                "/ready" => return self.handle_ready(),
                "/metrics" => return self.handle_metrics(),
                _ => {}
            }
        }

        let timeout = self.config.request_timeout();
        let (parts, body) = req.into_parts();

        let body = match tokio::time::timeout(timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read request body");
                return Self::error(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read request body: {e}"),
                );
            }
            Err(_) => {
                tracing::warn!("request body collection timed out");
                return Self::error(
                    StatusCode::REQUEST_TIMEOUT,
                    "Request body collection timed out",
                );
            }
        };

        let request = Request::from_parts(parts, Full::new(body));
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match tokio::time::timeout(timeout, self.service.handle(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(%method, %path, "request handling timed out");
                Self::error(StatusCode::GATEWAY_TIMEOUT, "Request handling timed out")
            }
        }
    }

    fn handle_health(&self) -> Response {
        let body = serde_json::to_vec(&self.health.status())
            .unwrap_or_else(|_| br#"{"status":"healthy"}"#.to_vec());
        Response::json(StatusCode::OK, body)
    }

    fn handle_ready(&self) -> Response {
        let status = self.readiness.status();
        let code = if status.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let body = serde_json::to_vec(&status)
            .unwrap_or_else(|_| format!(r#"{{"ready":{}}}"#, status.is_ready()).into_bytes());
        Response::json(code, body)
    }

    fn handle_metrics(&self) -> Response {
        let Some(metrics) = &self.metrics else {
            return Self::error(StatusCode::NOT_FOUND, "Metrics are disabled");
        };

        let mut response = Response::empty(StatusCode::OK);
        *response.body_mut() = Full::new(Bytes::from(metrics.render()));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE));
        response
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Response {
        Response::error_body(&ErrorBody::new(status, message))
    }
}

/// Builder for configuring and creating a [`Server`].
#[derive(Debug)]
pub struct ServerBuilder {
    service: InventoryService,
    config: ServerConfig,
    metrics: Option<MetricsRegistry>,
    service_name: String,
    service_version: String,
}

impl ServerBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new(service: InventoryService) -> Self {
        Self {
            service,
            config: ServerConfig::default(),
            metrics: None,
            service_name: "inventory".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Serves `registry` at `GET /metrics`.
    #[must_use]
    pub fn metrics(mut self, registry: MetricsRegistry) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Sets the service name for health checks.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Sets the service version for health checks.
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config,
            service: self.service,
            health: HealthCheck::new(self.service_name, self.service_version),
            readiness: ReadinessCheck::new(),
            metrics: self.metrics,
        }
    }
}
