//! The decision-service seam.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::decision::types::{DecisionContext, DecisionResult, Experiment};

/// An external service that resolves gates and experiments for a user.
///
/// Implementations must be safe to share across concurrent requests.
/// `initialize` may be called more than once and must tolerate it.
#[async_trait]
pub trait DecisionService: Send + Sync {
    /// Prepare the client (credentials, config source).
    async fn initialize(&self) -> DecisionResult<()>;

    /// Resolve an experiment's parameters for `user`.
    async fn get_experiment(&self, user: &DecisionContext, experiment: &str) -> DecisionResult<Experiment>;

    /// Evaluate a boolean gate for `user`.
    async fn check_gate(&self, user: &DecisionContext, gate: &str) -> DecisionResult<bool>;

    /// Buffer a custom event until the next flush.
    async fn log_event(&self, user: &DecisionContext, event_name: &str, metadata: Map<String, Value>) -> DecisionResult<()>;

    /// Send buffered exposure and custom events.
    async fn flush(&self) -> DecisionResult<()>;

    /// Every value of `param` configured across the experiment's groups.
    async fn experiment_buckets(&self, experiment: &str, param: &str) -> DecisionResult<Vec<String>>;
}
