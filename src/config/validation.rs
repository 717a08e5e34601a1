//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window and limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::GateConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("rate_limit.protected_paths: {0:?} must start with '/'")]
    InvalidPath(String),

    #[error("rate_limit.methods: {0:?} is not an HTTP method")]
    InvalidMethod(String),

    #[error("observability.log_level: unknown level {0:?}")]
    InvalidLogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "upstream.address", &config.upstream.address);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive { field: "timeouts.request_secs" });
    }

    let rl = &config.rate_limit;
    if rl.window_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "rate_limit.window_ms" });
    }
    if rl.max_attempts == 0 {
        errors.push(ValidationError::NotPositive { field: "rate_limit.max_attempts" });
    }
    if rl.max_keys == 0 {
        errors.push(ValidationError::NotPositive { field: "rate_limit.max_keys" });
    }
    if rl.cleanup_interval_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "rate_limit.cleanup_interval_ms" });
    }
    for path in &rl.protected_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidPath(path.clone()));
        }
    }
    for method in &rl.methods {
        if Method::from_bytes(method.to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &obs.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GateConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GateConfig::default();
        config.upstream.address = "localhost".to_string();
        config.rate_limit.window_ms = 0;
        config.rate_limit.max_keys = 0;
        config.rate_limit.protected_paths = vec!["api/auth/login".to_string()];
        config.rate_limit.methods = vec!["PO ST".to_string()];
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "upstream.address",
                    value: "localhost".to_string(),
                },
                ValidationError::NotPositive { field: "rate_limit.window_ms" },
                ValidationError::NotPositive { field: "rate_limit.max_keys" },
                ValidationError::InvalidPath("api/auth/login".to_string()),
                ValidationError::InvalidMethod("PO ST".to_string()),
                ValidationError::InvalidLogLevel("loud".to_string()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = GateConfig::default();
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::NotPositive { field: "rate_limit.max_attempts" };
        assert_eq!(err.to_string(), "rate_limit.max_attempts: must be greater than zero");
    }
}
