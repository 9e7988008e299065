//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::decision::Tier;

/// Root configuration for the edge bucket router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Decision-service connection settings.
    pub decision: DecisionConfig,

    /// Which experiment, parameter and gate drive the routing decision.
    pub experiment: ExperimentConfig,

    /// Visitor identity cookie.
    pub identity: IdentityConfig,

    /// Geo/IP request headers.
    pub geo: GeoConfig,

    /// Deployment tier passed to the decision service.
    pub deployment: DeploymentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Which decision-service collaborator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted decision service over HTTP.
    #[default]
    Http,
    /// In-process fixed answers, for local development.
    Fixed,
}

/// Decision-service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub provider: ProviderKind,

    /// Base URL of the evaluation API.
    pub api_url: String,

    /// Base URL of the console API (used only to enumerate buckets).
    pub console_url: String,

    /// Server secret. Usually supplied through `DECISION_SERVER_KEY`.
    pub server_key: String,

    /// Console secret. Usually supplied through `DECISION_CONSOLE_KEY`.
    pub console_key: String,

    /// Key of the config-store item the service reads its specs from.
    pub data_adapter_key: String,

    /// Deadline for the one-time initialization.
    pub init_timeout_ms: u64,

    /// Deadline for each experiment/gate query.
    pub call_timeout_ms: u64,

    /// Deadline for a background flush.
    pub flush_timeout_ms: u64,

    /// Events buffered between flushes before new ones are dropped.
    pub max_buffered_events: usize,

    /// Answers used by the `fixed` provider.
    pub fixed: FixedDecisionConfig,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Http,
            api_url: "https://api.decisions.example.com/v1".to_string(),
            console_url: "https://console.decisions.example.com/v1".to_string(),
            server_key: String::new(),
            console_key: String::new(),
            data_adapter_key: String::new(),
            init_timeout_ms: 1000,
            call_timeout_ms: 250,
            flush_timeout_ms: 2000,
            max_buffered_events: 500,
            fixed: FixedDecisionConfig::default(),
        }
    }
}

/// Answers for the fixed provider.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FixedDecisionConfig {
    /// Bucket every visitor gets. `None` behaves like an unset experiment.
    pub bucket: Option<String>,

    /// Gate value every visitor gets.
    pub gate: bool,

    /// Bucket names reported for static path enumeration.
    pub buckets: Vec<String>,
}

/// Experiment and gate names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Experiment whose parameter names the bucket.
    pub name: String,

    /// Parameter holding the bucket name.
    pub param: String,

    /// Gate deciding redirect (on) versus rewrite (off).
    pub gate: String,

    /// Bucket used when the experiment yields nothing.
    pub fallback_bucket: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "edge_bucket_experiment".to_string(),
            param: "bucket".to_string(),
            gate: "edge_redirect".to_string(),
            fallback_bucket: "default".to_string(),
        }
    }
}

/// Identity cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub cookie_name: String,

    /// Cookie lifetime; identities are stable for this long.
    pub max_age_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cookie_name: "uid".to_string(),
            max_age_secs: 60 * 60 * 24,
        }
    }
}

/// Header names carrying geo and client address information.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoConfig {
    pub country_header: String,
    pub default_country: String,
    pub real_ip_header: String,
    pub forwarded_for_header: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            country_header: "x-vercel-ip-country".to_string(),
            default_country: "US".to_string(),
            real_ip_header: "x-real-ip".to_string(),
            forwarded_for_header: "x-forwarded-for".to_string(),
        }
    }
}

/// Deployment settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Overridden by `APP_ENV` at startup.
    pub tier: Tier,
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
