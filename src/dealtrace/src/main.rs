//! DealTrace — multi-touch revenue attribution for the sales pipeline.
//!
//! Main entry point that wires the pipeline store, attribution engine,
//! and API server together.

use clap::Parser;
use dealtrace_api::ApiServer;
use dealtrace_attribution::AttributionEngine;
use dealtrace_core::config::AppConfig;
use dealtrace_pipeline::PipelineStore;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "dealtrace")]
#[command(about = "Multi-touch revenue attribution for the sales pipeline")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "DEALTRACE__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "DEALTRACE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Time-decay half-life in days (overrides config)
    #[arg(long, env = "DEALTRACE__ATTRIBUTION__HALF_LIFE_DAYS")]
    half_life_days: Option<f64>,

    /// Start with an empty pipeline store instead of demo data
    #[arg(long, default_value_t = false)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealtrace=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("DealTrace starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(half_life) = cli.half_life_days {
        config.attribution.half_life_days = half_life;
    }
    if cli.no_seed {
        config.pipeline.seed_demo = false;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        half_life_days = config.attribution.half_life_days,
        "Configuration loaded"
    );

    // Initialize the pipeline store
    let store = Arc::new(if config.pipeline.seed_demo {
        PipelineStore::with_demo_data()
    } else {
        PipelineStore::new()
    });

    // Initialize the attribution engine
    let engine = Arc::new(AttributionEngine::new(store, &config.attribution));

    // Start API server
    let api_server = ApiServer::new(config, engine);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("DealTrace is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
