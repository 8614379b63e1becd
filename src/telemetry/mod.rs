//! `Stats` aggregate: atomically-updated counters owned by the engine and
//! snapshottable on demand for `/health`, plus the request event bus.

pub mod events;

pub use events::{EventBus, RequestEvent};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::ErrorKind;

#[derive(Debug, Default)]
struct ErrorCounters {
    forbidden: AtomicU64,
    rate_limited: AtomicU64,
    unavailable: AtomicU64,
    server_error: AtomicU64,
    timeout: AtomicU64,
    network: AtomicU64,
}

/// Process-wide request counters, owned by the engine.
pub struct Stats {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    errors: ErrorCounters,
    started_at: Instant,
}

/// Point-in-time snapshot suitable for JSON serialization on `/health`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub error_403_count: u64,
    pub error_429_count: u64,
    pub error_503_count: u64,
    pub error_other_5xx_count: u64,
    pub error_timeout_count: u64,
    pub error_network_count: u64,
}

impl Stats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            errors: ErrorCounters::default(),
            started_at: Instant::now(),
        }
    }

    pub fn record_success(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
        match kind {
            ErrorKind::Forbidden => self.errors.forbidden.fetch_add(1, Ordering::Relaxed),
            ErrorKind::RateLimited => self.errors.rate_limited.fetch_add(1, Ordering::Relaxed),
            ErrorKind::Unavailable => self.errors.unavailable.fetch_add(1, Ordering::Relaxed),
            ErrorKind::ServerError => self.errors.server_error.fetch_add(1, Ordering::Relaxed),
            ErrorKind::Timeout => self.errors.timeout.fetch_add(1, Ordering::Relaxed),
            ErrorKind::Network => self.errors.network.fetch_add(1, Ordering::Relaxed),
            ErrorKind::Validation
            | ErrorKind::CircuitOpen
            | ErrorKind::ShuttingDown
            | ErrorKind::QueueFull => 0,
        };
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            total_requests: self.total.load(Ordering::Relaxed),
            success_requests: self.success.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            error_403_count: self.errors.forbidden.load(Ordering::Relaxed),
            error_429_count: self.errors.rate_limited.load(Ordering::Relaxed),
            error_503_count: self.errors.unavailable.load(Ordering::Relaxed),
            error_other_5xx_count: self.errors.server_error.load(Ordering::Relaxed),
            error_timeout_count: self.errors.timeout.load(Ordering::Relaxed),
            error_network_count: self.errors.network.load(Ordering::Relaxed),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_match_success_plus_failed() {
        let stats = Stats::new();
        stats.record_success();
        stats.record_failure(ErrorKind::Network);
        stats.record_failure(ErrorKind::Forbidden);
        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, snap.success_requests + snap.failed_requests);
        assert_eq!(snap.error_403_count, 1);
        assert_eq!(snap.error_network_count, 1);
    }
}
