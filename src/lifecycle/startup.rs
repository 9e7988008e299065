//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the decision-service collaborator and its shared gateway
//! - Enumerate bucket paths and pre-render their pages
//! - Start the flush worker and the HTTP listener
//! - Wind both down on a stop signal
//!
//! # Design Decisions
//! - Fail fast on local problems (bad config, port in use)
//! - Fail open on remote ones: an unreachable decision service still lets
//!   the server start with only the fallback page pre-rendered
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::decision::{build_service, DecisionError, DecisionGateway, FlushWorker};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::pages::{static_paths, PageStore};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("decision service setup failed: {0}")]
    Decision(#[from] DecisionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assemble the server and its flush worker without binding anything.
pub async fn build(config: Arc<AppConfig>) -> Result<(HttpServer, FlushWorker), StartupError> {
    let service = build_service(&config)?;
    let gateway = Arc::new(DecisionGateway::new(service, &config.decision));

    let paths = static_paths(&gateway, &config.experiment).await;
    let store = Arc::new(PageStore::prerender(&paths, &config.experiment));

    let (worker, flush) = FlushWorker::new(gateway.clone());
    let server = HttpServer::new(config, gateway, store, flush);
    Ok((server, worker))
}

/// Run the service until a stop signal arrives.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    let config = Arc::new(config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let (server, worker) = build(config.clone()).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let worker_task = tokio::spawn(worker.run(shutdown.subscribe()));
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    let served = server.run(listener, shutdown.subscribe()).await;

    // Covers the server exiting on its own; the worker still gets its final flush.
    shutdown.trigger();
    if let Err(e) = worker_task.await {
        tracing::error!(error = %e, "Flush worker panicked");
    }

    served?;
    Ok(())
}
