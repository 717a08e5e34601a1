//! Login throttle middleware.
//!
//! Counts requests on the protected paths per client IP and answers
//! `429 Too Many Requests` once a client exceeds its allowance for the
//! current window. The upstream never sees a limited request.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::client_ip::{normalize_client_ip, UNKNOWN_CLIENT};
use crate::security::rate_limit::now_millis;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let gate = state.inner.load_full();
    let settings = &gate.config.rate_limit;

    let path = request.uri().path().to_string();
    if !settings.enabled || !settings.applies_to(request.method().as_str(), &path) {
        return next.run(request).await;
    }

    let client = normalize_client_ip(request.headers());
    if client == UNKNOWN_CLIENT {
        tracing::debug!(path = %path, "No usable client IP, counting under shared key");
    }

    let now = now_millis();
    let (decision, tracked) = {
        let mut limiter = gate.limiter.lock().expect("rate limiter mutex poisoned");
        let decision = limiter.hit(&client, now);
        (decision, limiter.size())
    };
    metrics::record_limiter_size(tracked);

    if decision.limited {
        let retry_after = decision.retry_after_secs(now);
        tracing::warn!(
            client = %client,
            count = decision.count,
            reset_at = decision.reset_at,
            path = %path,
            "Login rate limit exceeded"
        );
        metrics::record_rate_limited(&path);
        return too_many_requests(retry_after);
    }

    let max_attempts = settings.max_attempts;
    drop(gate);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(max_attempts));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    response
}

fn too_many_requests(retry_after: u64) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, HeaderValue::from(retry_after))],
        Json(json!({
            "error": "Too many login attempts, retry later",
            "retry_after": retry_after,
        })),
    )
        .into_response()
}
