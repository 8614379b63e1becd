//! Validating builder for [`super::types::Config`].
//!
//! No field requires compile-time enforcement here — every field has a
//! sane default — so this stays a plain struct mirroring `Config`, with
//! fluent setters and a `build()` that validates before returning.

use crate::error::ConfigError;

use super::types::Config;

/// Fluent, validating builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    pub(super) max_retries: u32,
    pub(super) base_retry_delay_ms: u64,
    pub(super) request_timeout_secs: u64,
    pub(super) session_refresh_timeout_secs: u64,
    pub(super) max_concurrent_refresh: usize,
    pub(super) resource_clean_interval_min: u64,
    pub(super) session_inactive_time_min: u64,
    pub(super) circuit_failure_threshold: f64,
    pub(super) circuit_min_window: u32,
    pub(super) circuit_recovery_time_min: u64,
    pub(super) ipv6_prefix: String,
    pub(super) ipv6_start: u64,
    pub(super) ipv6_count: u64,
    pub(super) worker_concurrency: usize,
    pub(super) max_queue_depth: usize,
    pub(super) listen_port: u16,
    pub(super) origin_whitelist: Vec<String>,
    pub(super) session_required_hosts: Vec<String>,
    pub(super) home_origin: String,
    pub(super) shutdown_grace_secs: u64,
    pub(super) healthy_failure_rate_threshold: f64,
    pub(super) healthy_latency_threshold_ms: u64,
    pub(super) healthy_warmup_requests: u64,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        let d = Config::default();
        Self {
            max_retries: d.max_retries,
            base_retry_delay_ms: d.base_retry_delay_ms,
            request_timeout_secs: d.request_timeout_secs,
            session_refresh_timeout_secs: d.session_refresh_timeout_secs,
            max_concurrent_refresh: d.max_concurrent_refresh,
            resource_clean_interval_min: d.resource_clean_interval_min,
            session_inactive_time_min: d.session_inactive_time_min,
            circuit_failure_threshold: d.circuit_failure_threshold,
            circuit_min_window: d.circuit_min_window,
            circuit_recovery_time_min: d.circuit_recovery_time_min,
            ipv6_prefix: d.ipv6_prefix,
            ipv6_start: d.ipv6_start,
            ipv6_count: d.ipv6_count,
            worker_concurrency: d.worker_concurrency,
            max_queue_depth: d.max_queue_depth,
            listen_port: d.listen_port,
            origin_whitelist: d.origin_whitelist,
            session_required_hosts: d.session_required_hosts,
            home_origin: d.home_origin,
            shutdown_grace_secs: d.shutdown_grace_secs,
            healthy_failure_rate_threshold: d.healthy_failure_rate_threshold,
            healthy_latency_threshold_ms: d.healthy_latency_threshold_ms,
            healthy_warmup_requests: d.healthy_warmup_requests,
        }
    }
}

macro_rules! setter {
    ($name:ident, $field:ident, $ty:ty) => {
        #[must_use]
        pub fn $name(mut self, value: $ty) -> Self {
            self.$field = value;
            self
        }
    };
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    setter!(max_retries, max_retries, u32);
    setter!(base_retry_delay_ms, base_retry_delay_ms, u64);
    setter!(request_timeout_secs, request_timeout_secs, u64);
    setter!(max_concurrent_refresh, max_concurrent_refresh, usize);
    setter!(resource_clean_interval_min, resource_clean_interval_min, u64);
    setter!(session_inactive_time_min, session_inactive_time_min, u64);
    setter!(circuit_failure_threshold, circuit_failure_threshold, f64);
    setter!(circuit_min_window, circuit_min_window, u32);
    setter!(circuit_recovery_time_min, circuit_recovery_time_min, u64);
    setter!(ipv6_start, ipv6_start, u64);
    setter!(ipv6_count, ipv6_count, u64);
    setter!(worker_concurrency, worker_concurrency, usize);
    setter!(max_queue_depth, max_queue_depth, usize);
    setter!(listen_port, listen_port, u16);
    setter!(shutdown_grace_secs, shutdown_grace_secs, u64);

    #[must_use]
    pub fn ipv6_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ipv6_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn origin_whitelist(mut self, hosts: Vec<String>) -> Self {
        self.origin_whitelist = hosts;
        self
    }

    #[must_use]
    pub fn session_required_hosts(mut self, hosts: Vec<String>) -> Self {
        self.session_required_hosts = hosts;
        self
    }

    #[must_use]
    pub fn home_origin(mut self, origin: impl Into<String>) -> Self {
        self.home_origin = origin.into();
        self
    }

    /// Validate and produce a [`Config`].
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if any numeric field is out of its
    /// documented range (e.g. a failure-rate threshold outside `[0, 1]`, or
    /// an IPv6 count of zero).
    pub fn build(self) -> Result<Config, ConfigError> {
        if !(0.0..=1.0).contains(&self.circuit_failure_threshold) {
            return Err(ConfigError::Invalid {
                field: "circuit_failure_threshold",
                reason: "must be within [0.0, 1.0]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.healthy_failure_rate_threshold) {
            return Err(ConfigError::Invalid {
                field: "healthy_failure_rate_threshold",
                reason: "must be within [0.0, 1.0]".to_string(),
            });
        }
        if self.ipv6_count == 0 {
            return Err(ConfigError::Invalid {
                field: "ipv6_count",
                reason: "pool must contain at least one address".to_string(),
            });
        }
        if self.worker_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "worker_concurrency",
                reason: "at least one worker is required".to_string(),
            });
        }
        if self.origin_whitelist.is_empty() {
            return Err(ConfigError::Invalid {
                field: "origin_whitelist",
                reason: "whitelist must not be empty".to_string(),
            });
        }
        if self.ipv6_prefix.parse::<std::net::Ipv6Addr>().is_err()
            && format!("{}1", self.ipv6_prefix)
                .parse::<std::net::Ipv6Addr>()
                .is_err()
        {
            return Err(ConfigError::Invalid {
                field: "ipv6_prefix",
                reason: "prefix does not combine with an ordinal into a valid IPv6 address"
                    .to_string(),
            });
        }

        Ok(Config {
            max_retries: self.max_retries,
            base_retry_delay_ms: self.base_retry_delay_ms,
            request_timeout_secs: self.request_timeout_secs,
            session_refresh_timeout_secs: self.session_refresh_timeout_secs,
            max_concurrent_refresh: self.max_concurrent_refresh,
            resource_clean_interval_min: self.resource_clean_interval_min,
            session_inactive_time_min: self.session_inactive_time_min,
            circuit_failure_threshold: self.circuit_failure_threshold,
            circuit_min_window: self.circuit_min_window,
            circuit_recovery_time_min: self.circuit_recovery_time_min,
            ipv6_prefix: self.ipv6_prefix,
            ipv6_start: self.ipv6_start,
            ipv6_count: self.ipv6_count,
            worker_concurrency: self.worker_concurrency,
            max_queue_depth: self.max_queue_depth,
            listen_port: self.listen_port,
            origin_whitelist: self.origin_whitelist,
            session_required_hosts: self.session_required_hosts,
            home_origin: self.home_origin,
            shutdown_grace_secs: self.shutdown_grace_secs,
            healthy_failure_rate_threshold: self.healthy_failure_rate_threshold,
            healthy_latency_threshold_ms: self.healthy_latency_threshold_ms,
            healthy_warmup_requests: self.healthy_warmup_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_cleanly() {
        let cfg = ConfigBuilder::new().build().expect("defaults must validate");
        assert_eq!(cfg.max_retries(), 3);
        assert_eq!(cfg.ipv6_count(), 64);
    }

    #[test]
    fn rejects_bad_failure_threshold() {
        let err = ConfigBuilder::new()
            .circuit_failure_threshold(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "circuit_failure_threshold", .. }));
    }

    #[test]
    fn rejects_empty_pool() {
        let err = ConfigBuilder::new().ipv6_count(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ipv6_count", .. }));
    }
}
