//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::rate_limit::{RateLimitOptions, DEFAULT_CLEANUP_INTERVAL_MS};

/// Root configuration for the login gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The Spool Tracker application requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Login rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Fixed-window rate limiting for the login surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Attempts allowed per window and client.
    pub max_attempts: u32,

    /// Maximum number of clients tracked at once (LRU beyond that).
    pub max_keys: usize,

    /// Minimum spacing between expired-entry sweeps in milliseconds.
    pub cleanup_interval_ms: u64,

    /// Path prefixes that are counted.
    pub protected_paths: Vec<String>,

    /// HTTP methods that are counted. Empty means every method.
    pub methods: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 15 * 60 * 1000,
            max_attempts: 10,
            max_keys: 10_000,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            protected_paths: vec!["/api/auth/login".to_string()],
            methods: vec!["POST".to_string()],
        }
    }
}

impl RateLimitConfig {
    /// Limiter parameters for this configuration.
    pub fn limiter_options(&self) -> RateLimitOptions {
        RateLimitOptions {
            window_ms: self.window_ms,
            max_attempts: self.max_attempts,
            max_keys: self.max_keys,
            cleanup_interval_ms: Some(self.cleanup_interval_ms),
        }
    }

    /// Whether a request with this method and path is counted.
    ///
    /// A protected path matches itself and anything below it on a `/`
    /// boundary, so `/api/auth/login` covers `/api/auth/login/` but not
    /// `/api/auth/loginX`. Matching is on the raw request path; the upstream
    /// is expected to treat percent-encoded or doubled-slash spellings as
    /// different routes.
    pub fn applies_to(&self, method: &str, path: &str) -> bool {
        let method_matches = self.methods.is_empty()
            || self.methods.iter().any(|m| m.eq_ignore_ascii_case(method));

        method_matches && self.protected_paths.iter().any(|p| is_under(path, p))
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
