//! Bookstand API server binary entry point.
//!
//! A thin wrapper around the bookstand-api library that:
//! 1. Initializes logging
//! 2. Parses and validates configuration
//! 3. Starts the server

use anyhow::Result;
use bookstand_api::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Bookstand API server starting...");

    let config = ServerConfig::from_args();

    tracing::info!(
        "Configuration loaded: bind={}, remote_kv={}, search={}, events={}",
        config.bind,
        config.has_remote_kv(),
        config.has_search(),
        config.has_events()
    );

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
