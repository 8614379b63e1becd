//! Dispatcher admission behavior: bounded queue rejection and cooperative
//! cancellation while still queued. Both are exercised without any network
//! call, since the queue-depth check and the cancel/acquire race both
//! resolve before the engine is ever invoked.

mod common;

use std::sync::Arc;
use tokio::sync::Notify;

use fpfleet::engine::FetchOptions;
use fpfleet::error::ErrorKind;

#[tokio::test]
async fn rejects_submission_past_queue_depth() {
    let config = common::test_config();
    // Zero worker slots and zero queue depth: the very first submission
    // increments the queued counter past the bound and is rejected before
    // touching the worker semaphore at all.
    let config = fpfleet::config::ConfigBuilder::new()
        .ipv6_count(config.ipv6_count())
        .worker_concurrency(1)
        .max_queue_depth(0)
        .origin_whitelist(config.origin_whitelist().to_vec())
        .session_required_hosts(config.session_required_hosts().to_vec())
        .home_origin(config.home_origin())
        .build()
        .expect("config must validate");
    let dispatcher = common::build_dispatcher(config);

    let err = dispatcher
        .submit(
            "https://kh.example.invalid/data".to_string(),
            FetchOptions::default(),
            Arc::new(Notify::new()),
        )
        .await
        .expect_err("a full queue must reject immediately");

    assert_eq!(err.kind, ErrorKind::QueueFull);
    assert_eq!(dispatcher.queued_count(), 0, "the rejected submission must not leak a queue slot");
}

#[tokio::test]
async fn cancellation_wins_over_a_ready_worker_slot() {
    let dispatcher = common::build_dispatcher(common::test_config());
    let cancel = Arc::new(Notify::new());
    // Fire the cancellation before submitting: `Notify` buffers one permit,
    // and the dispatcher's `select! { biased; ... }` checks the cancel
    // branch first, so this resolves to `Cancelled` deterministically even
    // though a worker slot is also immediately available.
    cancel.notify_one();

    let outcome = dispatcher
        .submit("https://kh.example.invalid/data".to_string(), FetchOptions::default(), cancel)
        .await
        .expect("submit itself should not fail");

    assert!(matches!(outcome, fpfleet::dispatcher::JobOutcome::Cancelled));
    assert_eq!(dispatcher.queued_count(), 0);
}
