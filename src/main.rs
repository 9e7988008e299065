//! Edge bucket router.
//!
//! Routes visitors of `/` into A/B experiment buckets decided by an external
//! decision service, then serves one page per bucket.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────────┐
//!                         │                  EDGE BUCKET ROUTER                 │
//!                         │                                                     │
//!   GET /                 │  ┌──────────┐   ┌──────────┐   ┌────────────────┐  │
//!   ──────────────────────┼─▶│  http    │──▶│ routing  │──▶│    decision    │──┼──▶ decision
//!                         │  │  server  │   │ identity │   │    gateway     │  │    service
//!                         │  └──────────┘   └────┬─────┘   └───────┬────────┘  │
//!                         │                      │                 │           │
//!   302 /<bucket>         │                      ▼                 ▼           │
//!   ◀─────────────────────┼─────────────── redirect │ rewrite   flush worker ───┼──▶ events
//!   or page for /<bucket> │                      │                             │
//!                         │                      ▼                             │
//!                         │               ┌──────────────┐                     │
//!                         │               │    pages     │ (pre-rendered)      │
//!                         │               └──────────────┘                     │
//!                         └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_bucket_router::config::{load_config, load_from_env};
use edge_bucket_router::lifecycle;
use edge_bucket_router::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "edge-bucket-router")]
#[command(about = "Route visitors into experiment buckets at the edge", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus environment when omitted.
    #[arg(short, long, env = "EDGE_ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    init_logging(&config.observability)?;

    tracing::info!("edge-bucket-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        provider = ?config.decision.provider,
        experiment = %config.experiment.name,
        gate = %config.experiment.gate,
        tier = config.deployment.tier.as_str(),
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
