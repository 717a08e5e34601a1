//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → middleware/metrics.rs (count every response)
//!     → request.rs (assign request ID)
//!     → middleware/rate_limit.rs (login throttle, may answer 429)
//!     → server.rs proxy handler (forward to upstream)
//!     → Send upstream response to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GateState, HttpServer};
