//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::decision::Tier;

/// Environment variable holding the decision-service server key.
pub const ENV_SERVER_KEY: &str = "DECISION_SERVER_KEY";
/// Environment variable holding the console key used for bucket listing.
pub const ENV_CONSOLE_KEY: &str = "DECISION_CONSOLE_KEY";
/// Environment variable holding the data-adapter source key.
pub const ENV_DATA_ADAPTER_KEY: &str = "DECISION_DATA_ADAPTER_KEY";
/// Environment variable selecting the deployment tier.
pub const ENV_TIER: &str = "APP_ENV";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, then validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults plus the environment alone.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay secrets and the deployment tier from the environment.
///
/// `lookup` abstracts `std::env::var` so the overlay can be tested without
/// touching process state. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(key) = get(ENV_SERVER_KEY) {
        config.decision.server_key = key;
    }
    if let Some(key) = get(ENV_CONSOLE_KEY) {
        config.decision.console_key = key;
    }
    if let Some(key) = get(ENV_DATA_ADAPTER_KEY) {
        config.decision.data_adapter_key = key;
    }
    if let Some(env) = get(ENV_TIER) {
        config.deployment.tier = Tier::from_env_value(&env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SERVER_KEY, "server-secret"),
            (ENV_DATA_ADAPTER_KEY, "edge-item"),
            (ENV_TIER, "production"),
            (ENV_CONSOLE_KEY, ""),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.decision.console_key = "from-file".into();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.decision.server_key, "server-secret");
        assert_eq!(config.decision.data_adapter_key, "edge-item");
        assert_eq!(config.decision.console_key, "from-file");
        assert_eq!(config.deployment.tier, Tier::Production);
    }

    #[test]
    fn test_non_production_env_is_development() {
        let mut config = AppConfig::default();
        config.deployment.tier = Tier::Production;
        apply_env_overrides(&mut config, |k| (k == ENV_TIER).then(|| "staging".to_string()));
        assert_eq!(config.deployment.tier, Tier::Development);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[listener]
bind_address = "127.0.0.1:4000"

[decision]
provider = "fixed"

[decision.fixed]
bucket = "groupA"
gate = true
buckets = ["groupA", "groupB"]

[experiment]
name = "homepage_test"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.decision.fixed.bucket.as_deref(), Some("groupA"));
        assert!(config.decision.fixed.gate);
        assert_eq!(config.experiment.name, "homepage_test");
        assert_eq!(config.experiment.param, "bucket");
        assert_eq!(config.identity.max_age_secs, 86_400);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nrequest_secs = 0\n[decision]\nprovider = \"fixed\"").unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::Zero { field: "timeouts.request_secs" }]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
