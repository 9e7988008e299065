//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use edge_bucket_router::config::{AppConfig, ProviderKind};
use edge_bucket_router::decision::{
    DecisionContext, DecisionError, DecisionGateway, DecisionResult, DecisionService, Experiment, FlushWorker,
};
use edge_bucket_router::pages::{static_paths, PageStore};
use edge_bucket_router::HttpServer;

/// Scriptable in-process decision service that records what it was asked.
#[derive(Default)]
pub struct FakeDecisionService {
    pub bucket: Mutex<Option<String>>,
    pub gate: AtomicBool,
    pub unavailable: AtomicBool,
    pub buckets: Vec<String>,
    pub init_calls: AtomicU32,
    pub flush_calls: AtomicU32,
    pub users: Mutex<Vec<DecisionContext>>,
    pub events: Mutex<Vec<String>>,
}

impl FakeDecisionService {
    pub fn new(bucket: Option<&str>, gate: bool) -> Self {
        Self {
            bucket: Mutex::new(bucket.map(str::to_string)),
            gate: AtomicBool::new(gate),
            buckets: vec!["groupA".into(), "groupB".into()],
            ..Default::default()
        }
    }

    pub fn last_user(&self) -> Option<DecisionContext> {
        self.users.lock().unwrap().last().cloned()
    }

    fn check_up(&self) -> DecisionResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DecisionError::Unavailable("fake outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DecisionService for FakeDecisionService {
    async fn initialize(&self) -> DecisionResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()
    }

    async fn get_experiment(&self, user: &DecisionContext, experiment: &str) -> DecisionResult<Experiment> {
        self.check_up()?;
        self.users.lock().unwrap().push(user.clone());
        let mut resolved = Experiment::empty(experiment);
        if let Some(bucket) = self.bucket.lock().unwrap().clone() {
            resolved.value.insert("bucket".into(), Value::String(bucket));
        }
        Ok(resolved)
    }

    async fn check_gate(&self, _user: &DecisionContext, _gate: &str) -> DecisionResult<bool> {
        self.check_up()?;
        Ok(self.gate.load(Ordering::SeqCst))
    }

    async fn log_event(&self, _user: &DecisionContext, event_name: &str, _metadata: Map<String, Value>) -> DecisionResult<()> {
        self.events.lock().unwrap().push(event_name.to_string());
        Ok(())
    }

    async fn flush(&self) -> DecisionResult<()> {
        self.flush_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()
    }

    async fn experiment_buckets(&self, _experiment: &str, _param: &str) -> DecisionResult<Vec<String>> {
        self.check_up()?;
        Ok(self.buckets.clone())
    }
}

/// Config suitable for tests (no credentials needed).
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.decision.provider = ProviderKind::Fixed;
    config.decision.call_timeout_ms = 200;
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

/// Wire a server around `service`, with its flush worker running.
pub async fn app_with(service: Arc<FakeDecisionService>, config: AppConfig) -> (HttpServer, Arc<DecisionGateway>) {
    let config = Arc::new(config);
    let gateway = Arc::new(DecisionGateway::new(service, &config.decision));
    let paths = static_paths(&gateway, &config.experiment).await;
    let store = Arc::new(PageStore::prerender(&paths, &config.experiment));

    let (worker, flush) = FlushWorker::new(gateway.clone());
    let (_tx, rx) = tokio::sync::broadcast::channel(1);
    // Keep the sender alive for the life of the worker.
    tokio::spawn(async move {
        let _tx = _tx;
        worker.run(rx).await;
    });

    (HttpServer::new(config, gateway.clone(), store, flush), gateway)
}

/// Requests seen by the mock decision backend.
#[derive(Default)]
pub struct BackendLog {
    pub initialize: AtomicU32,
    pub get_config: AtomicU32,
    pub check_gate: AtomicU32,
    pub logged_events: Mutex<Vec<Value>>,
    pub api_keys: Mutex<Vec<String>>,
    pub stall: AtomicBool,
}

/// Start a mock hosted decision service on an ephemeral port.
///
/// Answers `bucket` for every user and `gate` for every gate.
pub async fn start_mock_decision_backend(bucket: &'static str, gate: bool) -> (SocketAddr, Arc<BackendLog>) {
    let log = Arc::new(BackendLog::default());

    fn record_key(log: &BackendLog, headers: &HeaderMap) {
        if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
            log.api_keys.lock().unwrap().push(key.to_string());
        }
    }

    let app = Router::new()
        .route(
            "/v1/initialize",
            post(|State(log): State<Arc<BackendLog>>, headers: HeaderMap| async move {
                record_key(&log, &headers);
                log.initialize.fetch_add(1, Ordering::SeqCst);
                StatusCode::OK
            }),
        )
        .route(
            "/v1/get_config",
            post(move |State(log): State<Arc<BackendLog>>, Json(body): Json<Value>| async move {
                if log.stall.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                log.get_config.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "name": body["configName"],
                    "value": { "bucket": bucket }
                }))
            }),
        )
        .route(
            "/v1/check_gate",
            post(move |State(log): State<Arc<BackendLog>>, Json(body): Json<Value>| async move {
                log.check_gate.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "name": body["gateName"], "value": gate }))
            }),
        )
        .route(
            "/v1/log_event",
            post(|State(log): State<Arc<BackendLog>>, Json(body): Json<Value>| async move {
                if let Some(events) = body["events"].as_array() {
                    log.logged_events.lock().unwrap().extend(events.iter().cloned());
                }
                StatusCode::ACCEPTED
            }),
        )
        .route(
            "/console/experiments/{name}",
            get(|| async {
                Json(json!({
                    "data": {
                        "name": "edge_bucket_experiment",
                        "groups": [
                            { "name": "Control", "parameterValues": { "bucket": "groupA" } },
                            { "name": "Test", "parameterValues": { "bucket": "groupB" } },
                            { "name": "Unset", "parameterValues": {} }
                        ]
                    }
                }))
            }),
        )
        .with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, log)
}
