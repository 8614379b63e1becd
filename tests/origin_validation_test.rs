//! End-to-end admission checks that never touch the network: a
//! non-whitelisted host, or a non-https URL, must be rejected by
//! `Engine::fetch` before any source IP or TLS client is ever created.

mod common;

use std::sync::Arc;
use tokio::sync::Notify;

use fpfleet::engine::FetchOptions;
use fpfleet::error::ErrorKind;

#[tokio::test]
async fn rejects_non_whitelisted_host() {
    let dispatcher = common::build_dispatcher(common::test_config());

    let outcome = dispatcher
        .submit(
            "https://evil.invalid/data".to_string(),
            FetchOptions::default(),
            Arc::new(Notify::new()),
        )
        .await
        .expect("submit itself should not fail");

    match outcome {
        fpfleet::dispatcher::JobOutcome::Completed(Err(err)) => {
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        other => panic!("expected a validation error, got a different outcome: {other:?}", other = describe(&other)),
    }
}

#[tokio::test]
async fn rejects_non_https_scheme() {
    let dispatcher = common::build_dispatcher(common::test_config());

    let outcome = dispatcher
        .submit(
            "http://kh.example.invalid/data".to_string(),
            FetchOptions::default(),
            Arc::new(Notify::new()),
        )
        .await
        .expect("submit itself should not fail");

    match outcome {
        fpfleet::dispatcher::JobOutcome::Completed(Err(err)) => {
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        other => panic!("expected a validation error, got a different outcome: {other:?}", other = describe(&other)),
    }
}

fn describe(outcome: &fpfleet::dispatcher::JobOutcome) -> &'static str {
    match outcome {
        fpfleet::dispatcher::JobOutcome::Completed(Ok(_)) => "Completed(Ok(_))",
        fpfleet::dispatcher::JobOutcome::Completed(Err(_)) => "Completed(Err(_))",
        fpfleet::dispatcher::JobOutcome::Cancelled => "Cancelled",
    }
}
