//! Inventory service entry point.

mod app;
mod cli;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = app::load_config(&cli)?;
    app::run(config).await
}
