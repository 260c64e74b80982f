//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "INVENTORY";

/// Configuration file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "inventory.toml";

/// Command-line arguments for the inventory server.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "inventory",
    version,
    about = "Serve the inventory item store over HTTP",
    after_help = "Configuration is layered: defaults, then the config file, then .env, \
then INVENTORY__SECTION__KEY environment variables, then --port."
)]
pub struct Cli {
    /// Port for the HTTP server, overriding every other source.
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to a TOML or JSON configuration file.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Start from the development preset (loopback host, debug level, pretty logs).
    #[arg(long)]
    pub dev: bool,
}
