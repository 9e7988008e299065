//! Background flushing of buffered events.
//!
//! # Data Flow
//! ```text
//! request handler ── FlushHandle::schedule() ──▶ [capacity-1 channel] ──▶ FlushWorker
//!                                                                          │
//!                                                   DecisionGateway::flush ◀┘
//! ```
//!
//! # Design Decisions
//! - `schedule` never blocks and never fails the caller
//! - A full channel means a flush is already pending; the request's events
//!   ride along with it
//! - Flush failures are logged and counted, never retried
//! - On shutdown the worker performs one last flush before exiting

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::decision::gateway::DecisionGateway;
use crate::observability::metrics;

/// Cheap, cloneable handle used by request handlers.
#[derive(Clone, Debug)]
pub struct FlushHandle {
    tx: mpsc::Sender<()>,
}

impl FlushHandle {
    /// Ask the worker to flush soon. Returns immediately.
    pub fn schedule(&self) {
        match self.tx.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                metrics::record_flush("coalesced");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::debug!("Flush worker stopped, skipping flush");
            }
        }
    }
}

/// Owns the receiving side and performs the flushes.
pub struct FlushWorker {
    gateway: Arc<DecisionGateway>,
    rx: mpsc::Receiver<()>,
}

impl FlushWorker {
    pub fn new(gateway: Arc<DecisionGateway>) -> (Self, FlushHandle) {
        let (tx, rx) = mpsc::channel(1);
        (Self { gateway, rx }, FlushHandle { tx })
    }

    /// Run until shutdown is signalled or every handle is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::debug!("Flush worker started");

        loop {
            tokio::select! {
                msg = self.rx.recv() => {
                    match msg {
                        Some(()) => self.flush_once().await,
                        None => break,
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Flush worker received shutdown signal, flushing remaining events");
                    break;
                }
            }
        }

        self.flush_once().await;
        tracing::debug!("Flush worker stopped");
    }

    async fn flush_once(&self) {
        match self.gateway.flush().await {
            Ok(()) => metrics::record_flush("ok"),
            Err(e) => {
                metrics::record_flush("error");
                tracing::warn!(error = %e, "Event flush failed");
            }
        }
    }
}
