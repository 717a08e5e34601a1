//! Request identification.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for requests that arrive without one
//! - Echo the ID on the response
//! - Expose the ID to handlers for log correlation
//!
//! # Design Decisions
//! - An incoming `x-request-id` is kept, so the upstream and the gate log
//!   the same ID
//! - Request ID added as early as possible for tracing

use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns a UUID v4 `x-request-id` to requests without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request ID of `request`, or `"unknown"` when none is set.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use axum::{body::Body, http::Response};
    use tower::{ServiceBuilder, ServiceExt};

    #[tokio::test]
    async fn test_layers_assign_and_echo_uuid() {
        let service = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .service_fn(|request: Request<Body>| async move {
                Ok::<_, Infallible>(Response::new(Body::from(request_id(&request))))
            });

        let response = service.oneshot(Request::new(Body::empty())).await.unwrap();
        let echoed = response.headers()[&X_REQUEST_ID].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&echoed).is_ok());

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, echoed.as_bytes());
    }

    #[test]
    fn test_request_id_lookup() {
        let request = Request::builder()
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&request), "abc-123");
        assert_eq!(request_id(&Request::new(Body::empty())), "unknown");
    }
}
