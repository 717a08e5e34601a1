//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on a protected path:
//!     → client_ip.rs (derive rate-limit key from proxy headers)
//!     → rate_limit.rs (count the hit in the client's fixed window)
//!     → limited? 429 : pass to the proxy handler
//! ```
//!
//! # Design Decisions
//! - Both pieces are pure, synchronous and never fail
//! - Limiter state lives in memory only; a restart resets all windows
//! - Clients without a usable IP share the `"unknown"` key

pub mod client_ip;
pub mod rate_limit;

pub use client_ip::{normalize_client_ip, HeaderLookup, UNKNOWN_CLIENT};
pub use rate_limit::{FixedWindowRateLimiter, RateLimitDecision, RateLimitOptions};
