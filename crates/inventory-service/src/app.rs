//! Wiring from configuration to a running server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use inventory_config::{ConfigLoader, InventoryConfig, LogFormat};
use inventory_core::{inventory_contract, ItemStore};
use inventory_server::{InventoryService, Server, ServerConfig};
use inventory_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};

use crate::cli::{Cli, DEFAULT_CONFIG_FILE, ENV_PREFIX};

/// Resolves the effective configuration for `cli`.
pub fn load_config(cli: &Cli) -> anyhow::Result<InventoryConfig> {
    let mut loader = ConfigLoader::new();
    if cli.dev {
        loader = loader.with_development();
    }

    loader = match &cli.config {
        Some(path) => loader
            .with_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };

    let mut config = loader
        .with_dotenv()?
        .with_env_prefix(ENV_PREFIX)
        .load()
        .context("invalid configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}

/// Maps the logging section onto the subscriber settings.
pub fn log_config(config: &InventoryConfig) -> LogConfig {
    let base = match config.logging.format {
        LogFormat::Json => LogConfig::production(),
        LogFormat::Pretty => LogConfig::development(),
    };
    LogConfig {
        enabled: config.logging.enabled,
        level: config.logging.level.clone(),
        ..base
    }
}

/// Maps the metrics section onto the exporter settings.
pub fn metrics_config(config: &InventoryConfig) -> MetricsConfig {
    MetricsConfig {
        enabled: config.metrics.enabled,
        ..MetricsConfig::default()
    }
}

/// Maps the server section onto the transport settings.
pub fn server_config(config: &InventoryConfig) -> ServerConfig {
    let server = &config.server;
    ServerConfig::builder()
        .http_addr(server.http_addr())
        .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
        .request_timeout(Duration::from_millis(server.request_timeout_ms))
        .header_read_timeout(Duration::from_secs(server.header_read_timeout_secs))
        .build()
}

/// Starts the server and blocks until it shuts down.
pub async fn run(config: InventoryConfig) -> anyhow::Result<()> {
    init_logging(&log_config(&config)).context("failed to initialize logging")?;
    let metrics = init_metrics(&metrics_config(&config)).context("failed to initialize metrics")?;

    let contract = Arc::new(inventory_contract().context("failed to load the API contract")?);
    tracing::info!(
        title = contract.title(),
        version = contract.version(),
        operations = contract.operations().len(),
        "contract loaded"
    );

    let store = Arc::new(ItemStore::with_first_id(config.store.first_id));
    let service = InventoryService::builder(contract, store)
        .validate_requests(config.contract.validate_requests)
        .record_metrics(config.metrics.enabled)
        .build();

    let mut builder = Server::builder(service)
        .config(server_config(&config))
        .service_version(env!("CARGO_PKG_VERSION"));
    if let Some(registry) = metrics {
        builder = builder.metrics(registry);
    }

    tracing::info!(
        addr = %config.server.http_addr(),
        validate_requests = config.contract.validate_requests,
        "starting inventory service"
    );
    builder.build().run().await?;
    Ok(())
}
