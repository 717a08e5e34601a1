//! Request middleware applied in front of the proxy handler.

pub mod metrics;
pub mod rate_limit;

pub use metrics::metrics_middleware;
pub use rate_limit::rate_limit_middleware;
