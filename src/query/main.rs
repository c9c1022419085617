//! HTTP server for IP region and nearest-place lookups.
//!
//! Loads the database fully before binding; a load failure aborts startup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ipix::api;
use ipix::config::{Config, Overrides};
use ipix::GeoDatabase;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "IP region and nearest-place lookup server")]
struct Args {
    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Database file
    #[arg(short, long)]
    dat: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Country code whose places enter the nearest-place index
    #[arg(long)]
    country: Option<String>,

    /// Refuse to start when IP ranges are not sorted by upper bound
    #[arg(long)]
    strict_order: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let settings = config.resolve(Overrides {
        listen: args.listen,
        dat: args.dat,
        country: args.country,
        strict_order: args.strict_order,
    })?;

    info!("ipix query server");

    let db = GeoDatabase::load(&settings.dat, settings.load.clone())
        .await
        .with_context(|| format!("Failed to load database {}", settings.dat.display()))?;

    let app = api::router(Arc::new(db));

    info!("Starting server on {}", settings.listen);

    let listener = tokio::net::TcpListener::bind(&settings.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
