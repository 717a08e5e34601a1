//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

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

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GateConfig, ConfigError> {
    let config: GateConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:8088"

            [rate_limit]
            window_ms = 60000
            max_attempts = 5
            methods = []
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8088");
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert!(config.rate_limit.methods.is_empty());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config = parse_config(include_str!("../../gate.example.toml")).unwrap();
        let defaults = GateConfig::default();

        assert_eq!(config.listener.bind_address, defaults.listener.bind_address);
        assert_eq!(config.upstream.address, defaults.upstream.address);
        assert_eq!(
            config.rate_limit.limiter_options(),
            defaults.rate_limit.limiter_options()
        );
        assert_eq!(config.rate_limit.protected_paths, defaults.rate_limit.protected_paths);
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("[rate_limit\nmax_attempts = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let err = parse_config("[rate_limit]\nmax_attempts = 0\nmax_keys = 0").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("does-not-exist-gate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("spool_gate_loader_test.toml");
        fs::write(&path, "[upstream]\naddress = \"127.0.0.1:4000\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.upstream.address, "127.0.0.1:4000");

        fs::remove_file(&path).unwrap_or_default();
    }
}
