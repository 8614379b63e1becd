//! Environment-variable overrides for [`super::types::Config`].
//!
//! Each recognized variable overrides the corresponding default from
//! [`super::defaults`] when present and parseable; an unparseable value is
//! logged and ignored rather than failing startup.

use super::builder::ConfigBuilder;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, raw, "ignoring unparseable environment override");
                None
            }
        },
        Err(_) => None,
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

impl ConfigBuilder {
    /// Apply recognized `FPFLEET_*` environment overrides onto this builder.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Some(v) = env_parse("FPFLEET_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_parse("FPFLEET_BASE_RETRY_DELAY_MS") {
            self.base_retry_delay_ms = v;
        }
        if let Some(v) = env_parse("FPFLEET_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("FPFLEET_SESSION_REFRESH_TIMEOUT_SECS") {
            self.session_refresh_timeout_secs = v;
        }
        if let Some(v) = env_parse("FPFLEET_MAX_CONCURRENT_REFRESH") {
            self.max_concurrent_refresh = v;
        }
        if let Some(v) = env_parse("FPFLEET_RESOURCE_CLEAN_INTERVAL_MIN") {
            self.resource_clean_interval_min = v;
        }
        if let Some(v) = env_parse("FPFLEET_SESSION_INACTIVE_TIME_MIN") {
            self.session_inactive_time_min = v;
        }
        if let Some(v) = env_parse("FPFLEET_CIRCUIT_FAILURE_THRESHOLD") {
            self.circuit_failure_threshold = v;
        }
        if let Some(v) = env_parse("FPFLEET_CIRCUIT_MIN_WINDOW") {
            self.circuit_min_window = v;
        }
        if let Some(v) = env_parse("FPFLEET_CIRCUIT_RECOVERY_TIME_MIN") {
            self.circuit_recovery_time_min = v;
        }
        if let Ok(v) = std::env::var("FPFLEET_IPV6_PREFIX") {
            self.ipv6_prefix = v;
        }
        if let Some(v) = env_parse("FPFLEET_IPV6_START") {
            self.ipv6_start = v;
        }
        if let Some(v) = env_parse("FPFLEET_IPV6_COUNT") {
            self.ipv6_count = v;
        }
        if let Some(v) = env_parse("FPFLEET_WORKER_CONCURRENCY") {
            self.worker_concurrency = v;
        }
        if let Some(v) = env_parse("FPFLEET_MAX_QUEUE_DEPTH") {
            self.max_queue_depth = v;
        }
        if let Some(v) = env_parse("FPFLEET_LISTEN_PORT") {
            self.listen_port = v;
        }
        if let Some(v) = env_list("FPFLEET_ORIGIN_WHITELIST") {
            self.origin_whitelist = v;
        }
        if let Some(v) = env_list("FPFLEET_SESSION_REQUIRED_HOSTS") {
            self.session_required_hosts = v;
        }
        if let Ok(v) = std::env::var("FPFLEET_HOME_ORIGIN") {
            self.home_origin = v;
        }
        if let Some(v) = env_parse("FPFLEET_SHUTDOWN_GRACE_SECS") {
            self.shutdown_grace_secs = v;
        }
        self
    }
}
