//! Fingerprint-aware egress fetching fleet daemon.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use fpfleet::binding::BindingCache;
use fpfleet::config::Config;
use fpfleet::dispatcher::Dispatcher;
use fpfleet::engine::Engine;
use fpfleet::ip_pool::IpPool;
use fpfleet::janitor::{self, Janitor};
use fpfleet::server::{self, AppState};
use fpfleet::telemetry::{EventBus, Stats};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Arc::new(Config::from_env()?);
    info!(
        pool_size = config.ipv6_count(),
        listen_port = config.listen_port(),
        "starting fpfleetd"
    );

    let pool = Arc::new(IpPool::new(config.ipv6_prefix(), config.ipv6_start(), config.ipv6_count()));
    let bindings = Arc::new(BindingCache::new(
        config.circuit_failure_threshold(),
        config.circuit_min_window(),
        config.circuit_recovery_time(),
    ));
    let stats = Arc::new(Stats::new());
    let events = Arc::new(EventBus::default());
    let shutting_down = Arc::new(AtomicBool::new(false));

    let engine = Arc::new(Engine::new(
        Arc::clone(&pool),
        Arc::clone(&bindings),
        Arc::clone(&config),
        Arc::clone(&stats),
        Arc::clone(&events),
        Arc::clone(&shutting_down),
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&engine),
        config.worker_concurrency(),
        config.max_queue_depth(),
    ));

    let janitor = Arc::new(Janitor::new(
        Arc::clone(&bindings),
        config.resource_clean_interval(),
        config.session_inactive_time(),
        Arc::clone(&shutting_down),
    ));
    let janitor_handle = janitor.spawn();

    let app_state = AppState {
        engine: Arc::clone(&engine),
        dispatcher: Arc::clone(&dispatcher),
        shutting_down: Arc::clone(&shutting_down),
    };
    let router = server::router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.listen_port())).await?;
    info!(port = config.listen_port(), "listening");

    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown_flag_for_signal = Arc::clone(&shutting_down);
    let shutdown_signal = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        // Flip the flag the instant a signal is observed so the engine
        // starts rejecting new admissions while axum drains connections.
        shutdown_flag_for_signal.store(true, std::sync::atomic::Ordering::Release);
    };

    let serve = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal);
    match tokio::time::timeout(config.shutdown_grace(), serve).await {
        Ok(result) => result?,
        Err(_elapsed) => info!("shutdown grace period elapsed before the HTTP layer drained"),
    }

    janitor::drain(
        &shutting_down,
        config.shutdown_grace(),
        &dispatcher,
        config.worker_concurrency(),
        &stats,
    )
    .await;

    janitor_handle.abort();
    Ok(())
}
