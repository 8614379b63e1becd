//! Shared test wiring: builds an `Engine`/`Dispatcher` pair from a `Config`
//! without touching the network or a real `main.rs` process.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use fpfleet::binding::BindingCache;
use fpfleet::config::{Config, ConfigBuilder};
use fpfleet::dispatcher::Dispatcher;
use fpfleet::engine::Engine;
use fpfleet::ip_pool::IpPool;
use fpfleet::telemetry::{EventBus, Stats};

#[allow(dead_code)]
pub fn test_config() -> Config {
    ConfigBuilder::new()
        .ipv6_count(4)
        .worker_concurrency(2)
        .max_queue_depth(2)
        .origin_whitelist(vec!["kh.example.invalid".to_string()])
        .session_required_hosts(vec!["kh.example.invalid".to_string()])
        .home_origin("kh.example.invalid")
        .build()
        .expect("test config must validate")
}

#[allow(dead_code)]
pub fn build_dispatcher(config: Config) -> Arc<Dispatcher> {
    build_engine_and_dispatcher(config).1
}

#[allow(dead_code)]
pub fn build_engine_and_dispatcher(config: Config) -> (Arc<Engine>, Arc<Dispatcher>) {
    let config = Arc::new(config);
    let pool = Arc::new(IpPool::new(config.ipv6_prefix(), config.ipv6_start(), config.ipv6_count()));
    let bindings = Arc::new(BindingCache::new(
        config.circuit_failure_threshold(),
        config.circuit_min_window(),
        config.circuit_recovery_time(),
    ));
    let stats = Arc::new(Stats::new());
    let events = Arc::new(EventBus::default());
    let shutting_down = Arc::new(AtomicBool::new(false));

    let engine = Arc::new(Engine::new(pool, bindings, config.clone(), stats, events, shutting_down));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&engine),
        config.worker_concurrency(),
        config.max_queue_depth(),
    ));
    (engine, dispatcher)
}
