//! Core configuration type for the egress fleet.

use std::time::Duration;

/// Operator-facing configuration for the fleet.
///
/// Construct via [`super::builder::ConfigBuilder`] or [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum retry attempts after the initial try (default 3).
    pub(crate) max_retries: u32,
    /// Base retry delay in milliseconds, doubled per attempt.
    pub(crate) base_retry_delay_ms: u64,
    /// Per-request deadline, in seconds.
    pub(crate) request_timeout_secs: u64,
    /// Timeout for a single session-refresh sub-request, in seconds.
    pub(crate) session_refresh_timeout_secs: u64,
    /// Process-wide cap on simultaneous cookie refreshes.
    pub(crate) max_concurrent_refresh: usize,
    /// Janitor sweep interval, in minutes.
    pub(crate) resource_clean_interval_min: u64,
    /// Per-IP inactivity threshold before the janitor reclaims state, in minutes.
    pub(crate) session_inactive_time_min: u64,
    /// Circuit breaker failure-rate threshold in `[0.0, 1.0]`.
    pub(crate) circuit_failure_threshold: f64,
    /// Minimum observed-request window before the breaker can open.
    pub(crate) circuit_min_window: u32,
    /// Circuit auto-recovery interval, in minutes.
    pub(crate) circuit_recovery_time_min: u64,
    /// IPv6 prefix, e.g. `"2001:db8::"`.
    pub(crate) ipv6_prefix: String,
    /// First ordinal appended to the prefix.
    pub(crate) ipv6_start: u64,
    /// Number of addresses to provision from `ipv6_start`.
    pub(crate) ipv6_count: u64,
    /// Bounded worker concurrency for the dispatcher.
    pub(crate) worker_concurrency: usize,
    /// Maximum queued jobs before the dispatcher rejects new submissions.
    pub(crate) max_queue_depth: usize,
    /// Listen port for the operator HTTP surface.
    pub(crate) listen_port: u16,
    /// Closed set of origin hostnames the engine may contact.
    pub(crate) origin_whitelist: Vec<String>,
    /// Hosts (subset of `origin_whitelist`) that require a cookie session.
    pub(crate) session_required_hosts: Vec<String>,
    /// Origin host used for `Referer`/`Origin` headers and the bootstrap GET.
    pub(crate) home_origin: String,
    /// Grace period for in-flight work to finish during shutdown, in seconds.
    pub(crate) shutdown_grace_secs: u64,
    /// Healthy-selection failure-rate threshold, distinct from the breaker.
    pub(crate) healthy_failure_rate_threshold: f64,
    /// Healthy-selection average-latency threshold, in milliseconds.
    pub(crate) healthy_latency_threshold_ms: u64,
    /// Warm-up request count before an address is eligible for the health check.
    pub(crate) healthy_warmup_requests: u64,
}

impl Config {
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn session_refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.session_refresh_timeout_secs)
    }

    #[must_use]
    pub fn max_concurrent_refresh(&self) -> usize {
        self.max_concurrent_refresh
    }

    #[must_use]
    pub fn resource_clean_interval(&self) -> Duration {
        Duration::from_secs(self.resource_clean_interval_min * 60)
    }

    #[must_use]
    pub fn session_inactive_time(&self) -> Duration {
        Duration::from_secs(self.session_inactive_time_min * 60)
    }

    #[must_use]
    pub fn circuit_failure_threshold(&self) -> f64 {
        self.circuit_failure_threshold
    }

    #[must_use]
    pub fn circuit_min_window(&self) -> u32 {
        self.circuit_min_window
    }

    #[must_use]
    pub fn circuit_recovery_time(&self) -> Duration {
        Duration::from_secs(self.circuit_recovery_time_min * 60)
    }

    #[must_use]
    pub fn ipv6_prefix(&self) -> &str {
        &self.ipv6_prefix
    }

    #[must_use]
    pub fn ipv6_start(&self) -> u64 {
        self.ipv6_start
    }

    #[must_use]
    pub fn ipv6_count(&self) -> u64 {
        self.ipv6_count
    }

    #[must_use]
    pub fn worker_concurrency(&self) -> usize {
        self.worker_concurrency
    }

    #[must_use]
    pub fn max_queue_depth(&self) -> usize {
        self.max_queue_depth
    }

    #[must_use]
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    #[must_use]
    pub fn origin_whitelist(&self) -> &[String] {
        &self.origin_whitelist
    }

    #[must_use]
    pub fn session_required_hosts(&self) -> &[String] {
        &self.session_required_hosts
    }

    #[must_use]
    pub fn home_origin(&self) -> &str {
        &self.home_origin
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    #[must_use]
    pub fn healthy_failure_rate_threshold(&self) -> f64 {
        self.healthy_failure_rate_threshold
    }

    #[must_use]
    pub fn healthy_latency_threshold(&self) -> Duration {
        Duration::from_millis(self.healthy_latency_threshold_ms)
    }

    #[must_use]
    pub fn healthy_latency_threshold_ms(&self) -> u64 {
        self.healthy_latency_threshold_ms
    }

    #[must_use]
    pub fn healthy_warmup_requests(&self) -> u64 {
        self.healthy_warmup_requests
    }
}
