//! Request metrics middleware.
//!
//! Wraps the whole router so every response is counted, including `/healthz`
//! and the 429s the login throttle answers itself.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::observability::metrics;

pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
