// ABOUTME: Entry point for the vaglio binary.
// ABOUTME: Parses CLI arguments, initializes tracing, recovers the engine, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use vaglio_core::LeasePolicy;
use vaglio_server::{AppState, VaglioConfig, create_router};
use vaglio_store::{DataLayout, recover_engine};

/// Lease-based review queue for annotation blocks and documents.
#[derive(Debug, Parser)]
#[command(name = "vaglio", version, about)]
struct Cli {
    /// Data directory (overrides VAGLIO_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Address to listen on (overrides VAGLIO_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaglio=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = VaglioConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    tracing::info!(data_dir = %config.data_dir.display(), "vaglio starting up");

    let layout = DataLayout::new(&config.data_dir);
    let recovered = recover_engine(&layout, LeasePolicy::from_secs(config.lease_ttl_secs))
        .with_context(|| format!("failed to recover state from {}", config.data_dir.display()))?;
    let engine = Arc::clone(&recovered.engine);

    let state = Arc::new(AppState::with_config(recovered.engine, &config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, flushing pending writes");
    if !engine.queue().flush().await {
        tracing::warn!("persistence worker stopped before flush completed");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
