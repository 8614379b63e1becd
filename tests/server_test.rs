//! Router-level tests for the operator HTTP surface, driven through
//! `tower::ServiceExt::oneshot` rather than a bound TCP listener.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use fpfleet::server::{router, AppState};

fn build_state() -> AppState {
    let (engine, dispatcher) = common::build_engine_and_dispatcher(common::test_config());
    AppState {
        engine,
        dispatcher,
        shutting_down: Arc::new(AtomicBool::new(false)),
    }
}

#[tokio::test]
async fn health_returns_200_with_expected_shape() {
    let app = router(build_state());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value.get("generated_at").is_some());
    assert!(value.get("stats").is_some());
    assert!(value.get("pool").is_some());
    assert!(value.get("sessions").is_some());
}

#[tokio::test]
async fn proxy_rejects_non_whitelisted_host_with_400() {
    let app = router(build_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/proxy?url=https://evil.invalid/data")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proxy_rejects_malformed_ipv6_query_param() {
    let app = router(build_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/proxy?url=https://kh.example.invalid/data&ipv6=not-an-address")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
