//! HTTP client for the hosted decision service.
//!
//! # Responsibilities
//! - Authenticate with the server key on every call
//! - Resolve experiments and gates for a user context
//! - Buffer exposure events and post them on flush
//! - List experiment buckets through the console API
//!
//! # Design Decisions
//! - No retries; callers bound every call with a deadline
//! - Exposures are recorded only for successful evaluations
//! - A failed flush drops the drained batch (at-most-once delivery)

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DecisionConfig;
use crate::decision::buffer::EventBuffer;
use crate::decision::service::DecisionService;
use crate::decision::types::{DecisionContext, DecisionError, DecisionResult, Experiment, ExposureEvent};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize)]
struct InitializeBody<'a> {
    #[serde(rename = "dataAdapterKey")]
    data_adapter_key: &'a str,
}

#[derive(Serialize)]
struct GetConfigBody<'a> {
    user: &'a DecisionContext,
    #[serde(rename = "configName")]
    config_name: &'a str,
}

#[derive(Serialize)]
struct CheckGateBody<'a> {
    user: &'a DecisionContext,
    #[serde(rename = "gateName")]
    gate_name: &'a str,
}

#[derive(Deserialize)]
struct GateResponse {
    #[serde(default)]
    value: bool,
}

#[derive(Serialize)]
struct LogEventBody<'a> {
    events: &'a [ExposureEvent],
}

#[derive(Deserialize)]
struct ConsoleExperiment {
    data: ConsoleExperimentData,
}

#[derive(Deserialize)]
struct ConsoleExperimentData {
    #[serde(default)]
    groups: Vec<ConsoleGroup>,
}

#[derive(Deserialize)]
struct ConsoleGroup {
    #[serde(default, rename = "parameterValues")]
    parameter_values: Map<String, Value>,
}

/// Decision service reached over HTTP.
pub struct HttpDecisionClient {
    client: Client,
    api_url: String,
    console_url: String,
    server_key: String,
    console_key: String,
    data_adapter_key: String,
    initialized: AtomicBool,
    events: EventBuffer,
}

impl HttpDecisionClient {
    /// Create a new client from configuration.
    pub fn new(config: &DecisionConfig) -> DecisionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.flush_timeout_ms.max(config.init_timeout_ms)))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            console_url: config.console_url.trim_end_matches('/').to_string(),
            server_key: config.server_key.clone(),
            console_key: config.console_key.clone(),
            data_adapter_key: config.data_adapter_key.clone(),
            initialized: AtomicBool::new(false),
            events: EventBuffer::new(config.max_buffered_events),
        })
    }

    /// Number of events waiting for the next flush.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn ensure_ready(&self) -> DecisionResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DecisionError::NotInitialized)
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: &'static str, body: &B) -> DecisionResult<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/{}", self.api_url, endpoint))
            .header(API_KEY_HEADER, &self.server_key)
            .json(body)
            .send()
            .await?;

        check_status(endpoint, response.status())?;
        Ok(response)
    }

    fn record_exposure(&self, name: &str, user: &DecisionContext, metadata: Map<String, Value>) {
        self.events.push(ExposureEvent::new(name, user, metadata));
    }
}

fn check_status(endpoint: &'static str, status: StatusCode) -> DecisionResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DecisionError::Status {
            endpoint,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl DecisionService for HttpDecisionClient {
    async fn initialize(&self) -> DecisionResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        self.post(
            "initialize",
            &InitializeBody {
                data_adapter_key: &self.data_adapter_key,
            },
        )
        .await?;

        self.initialized.store(true, Ordering::Release);
        tracing::info!(api_url = %self.api_url, "Decision client initialized");
        Ok(())
    }

    async fn get_experiment(&self, user: &DecisionContext, experiment: &str) -> DecisionResult<Experiment> {
        self.ensure_ready()?;

        let response = self
            .post(
                "get_config",
                &GetConfigBody {
                    user,
                    config_name: experiment,
                },
            )
            .await?;
        let mut resolved: Experiment = response
            .json()
            .await
            .map_err(|e| DecisionError::Decode(e.to_string()))?;
        if resolved.name.is_empty() {
            resolved.name = experiment.to_string();
        }

        let mut metadata = Map::new();
        metadata.insert("config".into(), Value::String(experiment.to_string()));
        self.record_exposure("config_exposure", user, metadata);

        Ok(resolved)
    }

    async fn check_gate(&self, user: &DecisionContext, gate: &str) -> DecisionResult<bool> {
        self.ensure_ready()?;

        let response = self
            .post(
                "check_gate",
                &CheckGateBody {
                    user,
                    gate_name: gate,
                },
            )
            .await?;
        let gate_response: GateResponse = response
            .json()
            .await
            .map_err(|e| DecisionError::Decode(e.to_string()))?;

        let mut metadata = Map::new();
        metadata.insert("gate".into(), Value::String(gate.to_string()));
        metadata.insert("gateValue".into(), Value::String(gate_response.value.to_string()));
        self.record_exposure("gate_exposure", user, metadata);

        Ok(gate_response.value)
    }

    async fn log_event(&self, user: &DecisionContext, event_name: &str, metadata: Map<String, Value>) -> DecisionResult<()> {
        self.ensure_ready()?;
        self.record_exposure(event_name, user, metadata);
        Ok(())
    }

    async fn flush(&self) -> DecisionResult<()> {
        let events = self.events.drain();
        if events.is_empty() {
            return Ok(());
        }

        let count = events.len();
        self.post("log_event", &LogEventBody { events: &events }).await?;
        tracing::debug!(events = count, "Flushed events");
        Ok(())
    }

    async fn experiment_buckets(&self, experiment: &str, param: &str) -> DecisionResult<Vec<String>> {
        if self.console_key.is_empty() {
            return Err(DecisionError::Unavailable("no console key configured".into()));
        }

        let response = self
            .client
            .get(format!("{}/experiments/{}", self.console_url, experiment))
            .header(API_KEY_HEADER, &self.console_key)
            .send()
            .await?;
        check_status("experiments", response.status())?;

        let body: ConsoleExperiment = response
            .json()
            .await
            .map_err(|e| DecisionError::Decode(e.to_string()))?;

        Ok(body
            .data
            .groups
            .into_iter()
            .filter_map(|g| g.parameter_values.get(param).and_then(Value::as_str).map(str::to_string))
            .collect())
    }
}
