//! Process-wide handle on the decision service.
//!
//! # Responsibilities
//! - Initialize the collaborator once, even under concurrent first requests
//! - Put a deadline on every call
//! - Turn failures into the fail-open assignment (fallback bucket, gate off)
//!
//! # Design Decisions
//! - `OnceCell::get_or_try_init` serializes the first initialization; a
//!   failed attempt is not cached, so a later request tries again
//! - The init deadline covers the wait for another caller's attempt too, so
//!   no request waits longer than one `init_timeout` during an outage
//! - Experiment and gate are queried concurrently
//! - A failed experiment lookup forces the gate off: a partial answer never
//!   redirects a visitor to the fallback page
//! - Nothing here ever returns an error to the routing path

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use crate::config::{DecisionConfig, ExperimentConfig};
use crate::decision::service::DecisionService;
use crate::decision::types::{DecisionContext, DecisionResult};
use crate::observability::metrics;
use crate::resilience::with_deadline;

/// What the decision service said about one visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub bucket: String,
    pub gate: bool,
    /// True when any part of the answer came from the fail-open path.
    pub degraded: bool,
}

/// Shared, lazily-initialized access to a `DecisionService`.
pub struct DecisionGateway {
    service: Arc<dyn DecisionService>,
    init: OnceCell<()>,
    init_timeout: Duration,
    call_timeout: Duration,
    flush_timeout: Duration,
}

impl DecisionGateway {
    pub fn new(service: Arc<dyn DecisionService>, config: &DecisionConfig) -> Self {
        Self {
            service,
            init: OnceCell::new(),
            init_timeout: Duration::from_millis(config.init_timeout_ms),
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            flush_timeout: Duration::from_millis(config.flush_timeout_ms),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Initialize the collaborator if no earlier call has succeeded.
    pub async fn ensure_initialized(&self) -> DecisionResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let start = Instant::now();
        let result = with_deadline(
            "initialize",
            self.init_timeout,
            self.init.get_or_try_init(|| self.service.initialize()),
        )
        .await;
        metrics::record_decision_latency("initialize", start);
        result.map(|_| ())
    }

    /// Resolve bucket and gate for `user`, failing open on any error.
    pub async fn assign(&self, user: &DecisionContext, experiment: &ExperimentConfig) -> Assignment {
        let fallback = || Assignment {
            bucket: experiment.fallback_bucket.clone(),
            gate: false,
            degraded: true,
        };

        if let Err(e) = self.ensure_initialized().await {
            metrics::record_decision_failure("initialize");
            tracing::warn!(error = %e, "Decision service initialization failed, using fallback bucket");
            return fallback();
        }

        let (experiment_result, gate_result) = tokio::join!(
            self.timed("get_experiment", self.service.get_experiment(user, &experiment.name)),
            self.timed("check_gate", self.service.check_gate(user, &experiment.gate)),
        );

        let bucket = match experiment_result {
            Ok(resolved) => resolved.get_str(&experiment.param, &experiment.fallback_bucket),
            Err(e) => {
                metrics::record_decision_failure("get_experiment");
                tracing::warn!(error = %e, experiment = %experiment.name, "Experiment lookup failed, using fallback bucket");
                return fallback();
            }
        };
        let bucket = if bucket.is_empty() {
            experiment.fallback_bucket.clone()
        } else {
            bucket
        };

        let mut degraded = false;
        let gate = match gate_result {
            Ok(value) => value,
            Err(e) => {
                degraded = true;
                metrics::record_decision_failure("check_gate");
                tracing::warn!(error = %e, gate = %experiment.gate, "Gate check failed, treating gate as off");
                false
            }
        };

        Assignment { bucket, gate, degraded }
    }

    /// Buffer a custom event for `user`.
    pub async fn log_event(&self, user: &DecisionContext, event_name: &str, metadata: Map<String, Value>) -> DecisionResult<()> {
        self.ensure_initialized().await?;
        self.timed("log_event", self.service.log_event(user, event_name, metadata))
            .await
    }

    /// Send buffered events, bounded by the flush deadline.
    pub async fn flush(&self) -> DecisionResult<()> {
        if !self.is_initialized() {
            return Ok(());
        }
        let start = Instant::now();
        let result = with_deadline("flush", self.flush_timeout, self.service.flush()).await;
        metrics::record_decision_latency("flush", start);
        result
    }

    /// Bucket names configured for an experiment.
    pub async fn experiment_buckets(&self, experiment: &ExperimentConfig) -> DecisionResult<Vec<String>> {
        self.ensure_initialized().await?;
        with_deadline(
            "experiment_buckets",
            self.flush_timeout,
            self.service.experiment_buckets(&experiment.name, &experiment.param),
        )
        .await
    }

    async fn timed<T, F>(&self, op: &'static str, fut: F) -> DecisionResult<T>
    where
        F: std::future::Future<Output = DecisionResult<T>>,
    {
        let start = Instant::now();
        let result = with_deadline(op, self.call_timeout, fut).await;
        metrics::record_decision_latency(op, start);
        result
    }
}
