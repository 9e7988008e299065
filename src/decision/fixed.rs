//! In-process decision service with fixed answers.
//!
//! Used for local development when no hosted service is available. Every
//! visitor gets the same bucket and gate value.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::schema::FixedDecisionConfig;
use crate::decision::buffer::EventBuffer;
use crate::decision::service::DecisionService;
use crate::decision::types::{DecisionContext, DecisionResult, Experiment, ExposureEvent};

pub struct FixedDecisionService {
    answers: FixedDecisionConfig,
    param: String,
    events: EventBuffer,
}

impl FixedDecisionService {
    /// `param` is the experiment parameter the fixed bucket is reported under.
    pub fn new(answers: FixedDecisionConfig, param: impl Into<String>, max_buffered_events: usize) -> Self {
        Self {
            answers,
            param: param.into(),
            events: EventBuffer::new(max_buffered_events),
        }
    }
}

#[async_trait]
impl DecisionService for FixedDecisionService {
    async fn initialize(&self) -> DecisionResult<()> {
        Ok(())
    }

    async fn get_experiment(&self, _user: &DecisionContext, experiment: &str) -> DecisionResult<Experiment> {
        let mut resolved = Experiment::empty(experiment);
        if let Some(bucket) = &self.answers.bucket {
            resolved.value.insert(self.param.clone(), Value::String(bucket.clone()));
        }
        Ok(resolved)
    }

    async fn check_gate(&self, _user: &DecisionContext, _gate: &str) -> DecisionResult<bool> {
        Ok(self.answers.gate)
    }

    async fn log_event(&self, user: &DecisionContext, event_name: &str, metadata: Map<String, Value>) -> DecisionResult<()> {
        self.events.push(ExposureEvent::new(event_name, user, metadata));
        Ok(())
    }

    async fn flush(&self) -> DecisionResult<()> {
        for event in self.events.drain() {
            tracing::debug!(event = %event.event_name, user = %event.user.user_id, "Dropping event (fixed provider)");
        }
        Ok(())
    }

    async fn experiment_buckets(&self, _experiment: &str, _param: &str) -> DecisionResult<Vec<String>> {
        let mut buckets = self.answers.buckets.clone();
        if let Some(bucket) = &self.answers.bucket {
            buckets.push(bucket.clone());
        }
        Ok(buckets)
    }
}
