//! Decision-service subsystem.
//!
//! # Data Flow
//! ```text
//! DecisionContext (per request)
//!     → gateway.rs (init once, deadlines, fail-open)
//!     → service.rs trait
//!         → http_client.rs (hosted service)
//!         → fixed.rs (local development)
//!     → Assignment { bucket, gate }
//!
//! Exposure events:
//!     buffer.rs (bounded) → flush.rs worker → DecisionService::flush
//! ```
//!
//! # Design Decisions
//! - The collaborator is opaque: this crate never buckets users itself
//! - One gateway per process, shared through Arc
//! - Analytics never sit on the response path

pub mod buffer;
pub mod fixed;
pub mod flush;
pub mod gateway;
pub mod http_client;
pub mod service;
pub mod types;

use std::sync::Arc;

pub use fixed::FixedDecisionService;
pub use flush::{FlushHandle, FlushWorker};
pub use gateway::{Assignment, DecisionGateway};
pub use http_client::HttpDecisionClient;
pub use service::DecisionService;
pub use types::{DecisionContext, DecisionError, DecisionResult, Experiment, ExposureEvent, Tier};

use crate::config::{AppConfig, ProviderKind};

/// Build the collaborator selected by configuration.
pub fn build_service(config: &AppConfig) -> DecisionResult<Arc<dyn DecisionService>> {
    let decision = &config.decision;
    let service: Arc<dyn DecisionService> = match decision.provider {
        ProviderKind::Http => Arc::new(HttpDecisionClient::new(decision)?),
        ProviderKind::Fixed => Arc::new(FixedDecisionService::new(
            decision.fixed.clone(),
            config.experiment.param.clone(),
            decision.max_buffered_events,
        )),
    };
    Ok(service)
}
