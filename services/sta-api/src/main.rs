//! SensorThings API Server
//!
//! OGC SensorThings API (core) over an in-memory entity store with optional
//! PostgreSQL persistence.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sta_api::build_router;
use sta_api::config::ServerConfig;
use sta_api::state::AppState;

/// SensorThings API Server
#[derive(Parser, Debug)]
#[command(name = "sta-api")]
#[command(about = "OGC SensorThings API server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "STA_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "STA_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// YAML configuration file
    #[arg(short, long, env = "STA_CONFIG")]
    config: Option<PathBuf>,

    /// PostgreSQL URL; entities stay in memory when unset
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    info!("Starting SensorThings API server");

    let config = ServerConfig::load_or_default(args.config.as_deref())?;
    let state = AppState::new(config, args.database_url.as_deref())
        .await?
        .with_prometheus(prometheus_handle);

    let app = build_router(Arc::new(state));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("SensorThings API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
