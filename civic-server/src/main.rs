//! civic-server binary
//!
//! Loads `.env`, reads configuration from the environment, and serves the
//! API. A missing `DATABASE_URL` aborts startup; an unreachable database
//! does not.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use civic_server::db::{ConnectionCache, PgConnector, PoolSettings};
use civic_server::tracing_setup::{self, TracingConfig};
use civic_server::{fault, run_server, AppState, ServerConfig};

/// Server command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "civic-server", version, about)]
pub struct ServerArgs {
    /// Bind address (overrides HOST/PORT)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in deployed environments
    let dotenv = dotenvy::dotenv();

    let args = ServerArgs::parse();
    tracing_setup::init(&TracingConfig { debug: args.debug })?;
    fault::install();

    if let Err(e) = &dotenv {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let mut config = ServerConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let database_url = config
        .require_database_url()
        .context("cannot start without a database connection string")?
        .to_owned();

    tracing::info!(
        bind_addr = %config.bind_addr,
        production = config.production,
        allowed_origins = ?config.allowed_origins.as_slice(),
        "Configuration loaded"
    );
    config.media.log_status();

    let cache = Arc::new(ConnectionCache::new(PgConnector::new(
        Some(database_url),
        PoolSettings::default(),
    )));

    // Warm the cache; requests arriving meanwhile join this attempt.
    let warm = Arc::clone(&cache);
    fault::spawn_logged("warm-connection", async move {
        warm.ensure_connection().await.map(|_| ())
    });

    let state = AppState::postgres(cache, config.allowed_origins.clone(), config.production);
    run_server(state, config.bind_addr).await?;

    Ok(())
}
