//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check credentials are present for the selected provider
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check names that end up in cookies and URL paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, ProviderKind};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Missing { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid address: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("{field} is not a valid URL: {value}")]
    BadUrl { field: &'static str, value: String },

    #[error("{field} contains characters not allowed here: {value}")]
    BadName { field: &'static str, value: String },
}

/// Validate an `AppConfig`, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let decision = &config.decision;
    if decision.provider == ProviderKind::Http {
        if decision.server_key.is_empty() {
            errors.push(ValidationError::Missing { field: "decision.server_key" });
        }
        if url::Url::parse(&decision.api_url).is_err() {
            errors.push(ValidationError::BadUrl {
                field: "decision.api_url",
                value: decision.api_url.clone(),
            });
        }
        if !decision.console_key.is_empty() && url::Url::parse(&decision.console_url).is_err() {
            errors.push(ValidationError::BadUrl {
                field: "decision.console_url",
                value: decision.console_url.clone(),
            });
        }
    }

    for (field, value) in [
        ("decision.init_timeout_ms", decision.init_timeout_ms),
        ("decision.call_timeout_ms", decision.call_timeout_ms),
        ("decision.flush_timeout_ms", decision.flush_timeout_ms),
        ("identity.max_age_secs", config.identity.max_age_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let experiment = &config.experiment;
    for (field, value) in [
        ("experiment.name", &experiment.name),
        ("experiment.param", &experiment.param),
        ("experiment.gate", &experiment.gate),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::Missing { field });
        }
    }

    if experiment.fallback_bucket.is_empty() {
        errors.push(ValidationError::Missing { field: "experiment.fallback_bucket" });
    } else if !is_path_segment(&experiment.fallback_bucket) {
        errors.push(ValidationError::BadName {
            field: "experiment.fallback_bucket",
            value: experiment.fallback_bucket.clone(),
        });
    }

    let cookie_name = &config.identity.cookie_name;
    if cookie_name.is_empty() {
        errors.push(ValidationError::Missing { field: "identity.cookie_name" });
    } else if !is_cookie_token(cookie_name) {
        errors.push(ValidationError::BadName {
            field: "identity.cookie_name",
            value: cookie_name.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Unreserved URI characters only, so `/<bucket>` never needs encoding.
fn is_path_segment(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}

/// RFC 6265 cookie-name token.
fn is_cookie_token(value: &str) -> bool {
    value.chars().all(|c| {
        c.is_ascii_graphic() && !matches!(c, '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '=' | '{' | '}')
    })
}
