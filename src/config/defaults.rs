//! Default values for [`super::types::Config`].
//!
//! Defaults: max retries 3, base delay, refresh cap 5, janitor interval
//! 5 min, inactivity 30 min, shutdown grace 30 s. The default origin
//! whitelist is a small set of Google Earth-related hosts.

use super::types::Config;

pub(super) const DEFAULT_MAX_RETRIES: u32 = 3;
pub(super) const DEFAULT_BASE_RETRY_DELAY_MS: u64 = 250;
pub(super) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub(super) const DEFAULT_SESSION_REFRESH_TIMEOUT_SECS: u64 = 15;
pub(super) const DEFAULT_MAX_CONCURRENT_REFRESH: usize = 5;
pub(super) const DEFAULT_RESOURCE_CLEAN_INTERVAL_MIN: u64 = 5;
pub(super) const DEFAULT_SESSION_INACTIVE_TIME_MIN: u64 = 30;
pub(super) const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: f64 = 0.8;
pub(super) const DEFAULT_CIRCUIT_MIN_WINDOW: u32 = 20;
pub(super) const DEFAULT_CIRCUIT_RECOVERY_TIME_MIN: u64 = 5;
pub(super) const DEFAULT_IPV6_PREFIX: &str = "2001:db8::";
pub(super) const DEFAULT_IPV6_START: u64 = 1;
pub(super) const DEFAULT_IPV6_COUNT: u64 = 64;
pub(super) const DEFAULT_WORKER_CONCURRENCY: usize = 10;
pub(super) const DEFAULT_MAX_QUEUE_DEPTH: usize = 200;
pub(super) const DEFAULT_LISTEN_PORT: u16 = 8080;
pub(super) const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
pub(super) const DEFAULT_HEALTHY_FAILURE_RATE_THRESHOLD: f64 = 0.3;
pub(super) const DEFAULT_HEALTHY_LATENCY_THRESHOLD_MS: u64 = 2_000;
pub(super) const DEFAULT_HEALTHY_WARMUP_REQUESTS: u64 = 10;

pub(super) fn default_origin_whitelist() -> Vec<String> {
    vec![
        "kh.example.invalid".to_string(),
        "earth.example.invalid".to_string(),
        "static.earth.example.invalid".to_string(),
    ]
}

pub(super) fn default_session_required_hosts() -> Vec<String> {
    vec!["kh.example.invalid".to_string()]
}

pub(super) fn default_home_origin() -> String {
    "earth.example.invalid".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_retry_delay_ms: DEFAULT_BASE_RETRY_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_refresh_timeout_secs: DEFAULT_SESSION_REFRESH_TIMEOUT_SECS,
            max_concurrent_refresh: DEFAULT_MAX_CONCURRENT_REFRESH,
            resource_clean_interval_min: DEFAULT_RESOURCE_CLEAN_INTERVAL_MIN,
            session_inactive_time_min: DEFAULT_SESSION_INACTIVE_TIME_MIN,
            circuit_failure_threshold: DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            circuit_min_window: DEFAULT_CIRCUIT_MIN_WINDOW,
            circuit_recovery_time_min: DEFAULT_CIRCUIT_RECOVERY_TIME_MIN,
            ipv6_prefix: DEFAULT_IPV6_PREFIX.to_string(),
            ipv6_start: DEFAULT_IPV6_START,
            ipv6_count: DEFAULT_IPV6_COUNT,
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            listen_port: DEFAULT_LISTEN_PORT,
            origin_whitelist: default_origin_whitelist(),
            session_required_hosts: default_session_required_hosts(),
            home_origin: default_home_origin(),
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
            healthy_failure_rate_threshold: DEFAULT_HEALTHY_FAILURE_RATE_THRESHOLD,
            healthy_latency_threshold_ms: DEFAULT_HEALTHY_LATENCY_THRESHOLD_MS,
            healthy_warmup_requests: DEFAULT_HEALTHY_WARMUP_REQUESTS,
        }
    }
}
