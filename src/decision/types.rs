//! Decision-service types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::identity::VisitorId;

/// Deployment tier reported to the decision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Production,
    #[default]
    Development,
}

impl Tier {
    /// `"production"` selects production; every other value is development.
    pub fn from_env_value(value: &str) -> Self {
        if value == "production" {
            Tier::Production
        } else {
            Tier::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Production => "production",
            Tier::Development => "development",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub tier: Tier,
}

/// Per-request attributes handed to the decision service.
///
/// Built fresh for every request and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub country: String,
    pub ip: String,
    pub environment: Environment,
}

impl DecisionContext {
    pub fn new(id: &VisitorId, country: impl Into<String>, ip: impl Into<String>, tier: Tier) -> Self {
        Self {
            user_id: id.as_str().to_string(),
            country: country.into(),
            ip: ip.into(),
            environment: Environment { tier },
        }
    }
}

/// Resolved experiment parameters for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Map<String, Value>,
}

impl Experiment {
    /// An experiment with no parameters, as returned for unknown experiments.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Map::new(),
        }
    }

    /// String parameter, or `fallback` when absent or not a string.
    pub fn get_str(&self, param: &str, fallback: &str) -> String {
        self.value
            .get(param)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    }
}

/// A buffered exposure or custom event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureEvent {
    #[serde(rename = "eventName")]
    pub event_name: String,
    pub user: DecisionContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Milliseconds since the Unix epoch.
    pub time: u64,
}

impl ExposureEvent {
    pub fn new(event_name: impl Into<String>, user: &DecisionContext, metadata: Map<String, Value>) -> Self {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            event_name: event_name.into(),
            user: user.clone(),
            value: None,
            metadata,
            time,
        }
    }
}

/// Errors that can occur talking to the decision service.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// A query was made before `initialize` succeeded.
    #[error("decision service not initialized")]
    NotInitialized,

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// The response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The call did not finish before its deadline.
    #[error("{op} timed out after {millis} ms")]
    Timeout { op: &'static str, millis: u64 },

    /// The collaborator cannot serve this request.
    #[error("decision service unavailable: {0}")]
    Unavailable(String),
}

/// Result type for decision-service operations.
pub type DecisionResult<T> = Result<T, DecisionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_wire_shape() {
        let id = VisitorId::from_trusted("abc-123").unwrap();
        let ctx = DecisionContext::new(&id, "US", "", Tier::Production);
        assert_eq!(
            serde_json::to_value(&ctx).unwrap(),
            json!({
                "userID": "abc-123",
                "country": "US",
                "ip": "",
                "environment": { "tier": "production" }
            })
        );
    }

    #[test]
    fn test_experiment_get_str() {
        let exp: Experiment = serde_json::from_value(json!({
            "name": "exp",
            "value": { "bucket": "groupA", "count": 3 }
        }))
        .unwrap();

        assert_eq!(exp.get_str("bucket", "default"), "groupA");
        assert_eq!(exp.get_str("count", "default"), "default");
        assert_eq!(exp.get_str("missing", "default"), "default");
        assert_eq!(Experiment::empty("exp").get_str("bucket", "default"), "default");
    }

    #[test]
    fn test_tier_from_env() {
        assert_eq!(Tier::from_env_value("production"), Tier::Production);
        assert_eq!(Tier::from_env_value("Production"), Tier::Development);
        assert_eq!(Tier::from_env_value("test"), Tier::Development);
    }
}
