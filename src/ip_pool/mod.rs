//! Source-IP pool.
//!
//! Owns the finite, ordered set of bindable source IPv6 addresses. Built
//! once at startup from a prefix/start/count triple and never resized
//! afterward — a failing address is hidden by selection heuristics or the
//! circuit breaker in `binding`, never removed from the pool itself.

use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::warn;

/// Per-address counters. `min_latency_ms`/`max_latency_ms` start at
/// sentinel values and only become meaningful once `total_requests() > 0`.
#[derive(Debug)]
pub struct SourceIpRecord {
    address: Ipv6Addr,
    usage: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    latency_sum_ms: AtomicU64,
    min_latency_ms: AtomicU64,
    max_latency_ms: AtomicU64,
    last_used_millis: AtomicU64,
}

const NO_LATENCY: u64 = u64::MAX;

impl SourceIpRecord {
    fn new(address: Ipv6Addr) -> Self {
        Self {
            address,
            usage: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            latency_sum_ms: AtomicU64::new(0),
            min_latency_ms: AtomicU64::new(NO_LATENCY),
            max_latency_ms: AtomicU64::new(0),
            last_used_millis: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn address(&self) -> Ipv6Addr {
        self.address
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.success.load(Ordering::Relaxed) + self.failure.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.failure.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    #[must_use]
    pub fn avg_latency_ms(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.latency_sum_ms.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    #[must_use]
    pub fn min_latency_ms(&self) -> Option<u64> {
        match self.min_latency_ms.load(Ordering::Relaxed) {
            NO_LATENCY => None,
            v => Some(v),
        }
    }

    #[must_use]
    pub fn max_latency_ms(&self) -> Option<u64> {
        if self.total_requests() == 0 {
            None
        } else {
            Some(self.max_latency_ms.load(Ordering::Relaxed))
        }
    }

    fn record(&self, success: bool, latency_ms: u64) {
        if success {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.min_latency_ms.fetch_min(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);
    }

    fn mark_used(&self, epoch_start: Instant) {
        self.usage.fetch_add(1, Ordering::Relaxed);
        self.last_used_millis
            .store(epoch_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    }
}

/// Aggregated, derived statistics over the whole pool. Cheap to compute on
/// demand for the monitoring API.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    pub pool_size: usize,
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub avg_requests_per_ip: f64,
    pub max_requests_on_one_ip: u64,
    pub min_requests_on_one_ip: u64,
    pub load_imbalance: f64,
    pub avg_latency_ms: f64,
    pub uptime_secs: u64,
    pub requests_per_second: f64,
}

/// Selection strategy used by [`IpPool::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Plain round-robin over all addresses.
    Next,
    /// Skip unhealthy addresses (warmed-up, over failure-rate or latency
    /// threshold); among the rest, pick the least-used. Falls back to
    /// round-robin, with a warning, if nothing qualifies.
    HealthyNext {
        failure_rate_threshold: f64,
        latency_threshold_ms: u64,
        warmup_requests: u64,
    },
    /// Uniform random; used only for health probes.
    Random,
}

pub struct IpPool {
    records: Vec<SourceIpRecord>,
    index_of: HashMap<Ipv6Addr, usize>,
    round_robin: AtomicUsize,
    epoch_start: Instant,
}

impl IpPool {
    /// Construct the pool: `count` addresses of the form `<prefix><ordinal>`
    /// starting at `start`.
    ///
    /// # Panics
    /// Panics if `prefix` combined with an ordinal does not parse as IPv6 —
    /// callers should validate this ahead of time via
    /// [`crate::config::ConfigBuilder::build`].
    #[must_use]
    pub fn new(prefix: &str, start: u64, count: u64) -> Self {
        let mut records = Vec::with_capacity(count as usize);
        let mut index_of = HashMap::with_capacity(count as usize);
        for offset in 0..count {
            let ordinal = start + offset;
            let addr: Ipv6Addr = format!("{prefix}{ordinal}")
                .parse()
                .unwrap_or_else(|_| panic!("invalid pool address: {prefix}{ordinal}"));
            index_of.insert(addr, records.len());
            records.push(SourceIpRecord::new(addr));
        }
        Self {
            records,
            index_of,
            round_robin: AtomicUsize::new(0),
            epoch_start: Instant::now(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn record_for(&self, ip: Ipv6Addr) -> Option<&SourceIpRecord> {
        self.index_of.get(&ip).map(|&i| &self.records[i])
    }

    #[must_use]
    pub fn contains(&self, ip: Ipv6Addr) -> bool {
        self.index_of.contains_key(&ip)
    }

    fn next_round_robin(&self) -> Ipv6Addr {
        let idx = self.round_robin.fetch_add(1, Ordering::Relaxed) % self.records.len();
        let record = &self.records[idx];
        record.mark_used(self.epoch_start);
        record.address()
    }

    /// Select a source IP using the given strategy. The returned address's
    /// usage counter has already been incremented atomically.
    ///
    /// # Panics
    /// Panics if the pool is empty.
    #[must_use]
    pub fn select(&self, strategy: Selection) -> Ipv6Addr {
        assert!(!self.is_empty(), "source IP pool must not be empty");
        match strategy {
            Selection::Next => self.next_round_robin(),
            Selection::Random => {
                let idx = rand::rng().random_range(0..self.records.len());
                let record = &self.records[idx];
                record.mark_used(self.epoch_start);
                record.address()
            }
            Selection::HealthyNext {
                failure_rate_threshold,
                latency_threshold_ms,
                warmup_requests,
            } => {
                let candidate = self
                    .records
                    .iter()
                    .filter(|r| {
                        let total = r.total_requests();
                        total < warmup_requests
                            || (r.failure_rate() <= failure_rate_threshold
                                && r.avg_latency_ms() <= latency_threshold_ms as f64)
                    })
                    .min_by_key(|r| r.usage.load(Ordering::Relaxed));

                match candidate {
                    Some(record) => {
                        record.mark_used(self.epoch_start);
                        record.address()
                    }
                    None => {
                        warn!("no healthy source IP available; falling back to round-robin");
                        self.next_round_robin()
                    }
                }
            }
        }
    }

    /// Record the terminal outcome of a request against `ip`.
    pub fn record_request(&self, ip: Ipv6Addr, success: bool, latency_ms: u64) {
        if let Some(record) = self.record_for(ip) {
            record.record(success, latency_ms);
        }
    }

    /// Compute a point-in-time statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let pool_size = self.records.len();
        let total_success: u64 = self.records.iter().map(SourceIpRecord::success_count).sum();
        let total_failure: u64 = self.records.iter().map(SourceIpRecord::failure_count).sum();
        let total = total_success + total_failure;
        let usages: Vec<u64> = self
            .records
            .iter()
            .map(|r| r.usage.load(Ordering::Relaxed))
            .collect();
        let max_on_one = usages.iter().copied().max().unwrap_or(0);
        let min_on_one = usages.iter().copied().min().unwrap_or(0);
        let avg_per_ip = if pool_size == 0 {
            0.0
        } else {
            usages.iter().sum::<u64>() as f64 / pool_size as f64
        };
        let load_imbalance = if avg_per_ip > 0.0 {
            (max_on_one as f64 - min_on_one as f64) / avg_per_ip
        } else {
            0.0
        };
        let avg_latency_ms = if total == 0 {
            0.0
        } else {
            self.records
                .iter()
                .map(|r| r.latency_sum_ms.load(Ordering::Relaxed))
                .sum::<u64>() as f64
                / total as f64
        };
        let uptime = self.epoch_start.elapsed();
        let requests_per_second = if uptime.as_secs_f64() > 0.0 {
            total as f64 / uptime.as_secs_f64()
        } else {
            0.0
        };

        PoolStats {
            pool_size,
            total_requests: total,
            success_requests: total_success,
            failed_requests: total_failure,
            success_rate: if total == 0 {
                0.0
            } else {
                total_success as f64 / total as f64
            },
            avg_requests_per_ip: avg_per_ip,
            max_requests_on_one_ip: max_on_one,
            min_requests_on_one_ip: min_on_one,
            load_imbalance,
            avg_latency_ms,
            uptime_secs: uptime.as_secs(),
            requests_per_second,
        }
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.epoch_start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_robin_covers_every_address_once() {
        let pool = IpPool::new("2001:db8::", 1, 4);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..4 {
            seen.insert(pool.select(Selection::Next));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn healthy_next_skips_unhealthy_after_warmup() {
        let pool = IpPool::new("2001:db8::", 1, 2);
        let bad = pool.select(Selection::Next);
        for _ in 0..20 {
            pool.record_request(bad, false, 10);
        }
        let strategy = Selection::HealthyNext {
            failure_rate_threshold: 0.5,
            latency_threshold_ms: 10_000,
            warmup_requests: 5,
        };
        for _ in 0..10 {
            assert_ne!(pool.select(strategy), bad);
        }
    }

    #[test]
    fn healthy_next_falls_back_when_all_unhealthy() {
        let pool = IpPool::new("2001:db8::", 1, 2);
        for addr in [
            "2001:db8::1".parse::<Ipv6Addr>().unwrap(),
            "2001:db8::2".parse::<Ipv6Addr>().unwrap(),
        ] {
            for _ in 0..20 {
                pool.record_request(addr, false, 10);
            }
        }
        let strategy = Selection::HealthyNext {
            failure_rate_threshold: 0.1,
            latency_threshold_ms: 1,
            warmup_requests: 1,
        };
        // Must not deadlock or panic; falls back to round-robin.
        let _ = pool.select(strategy);
    }

    #[test]
    fn invariant_total_equals_success_plus_failure() {
        let pool = IpPool::new("2001:db8::", 1, 1);
        let ip = pool.select(Selection::Next);
        pool.record_request(ip, true, 5);
        pool.record_request(ip, false, 7);
        let record = pool.record_for(ip).unwrap();
        assert_eq!(record.total_requests(), record.success_count() + record.failure_count());
    }

    #[test]
    fn ordinals_are_formatted_in_decimal_not_hex() {
        // start=1001: hex and decimal diverge here (0x3e9 != 1001), so this
        // is exactly the case a hex-formatting regression would break.
        let pool = IpPool::new("2001:db8::", 1001, 4);
        let expected: Vec<Ipv6Addr> = (1001..1005).map(|n| format!("2001:db8::{n}").parse().unwrap()).collect();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(pool.select(Selection::Next));
        }
        seen.sort();
        let mut expected_sorted = expected.clone();
        expected_sorted.sort();
        assert_eq!(seen, expected_sorted);
        assert!(pool.record_for(expected[0]).is_some(), "2001:db8::1001 must be a provisioned address");
    }

    proptest::proptest! {
        // Any prefix/start/count combination must produce addresses whose
        // last hextet is the plain decimal ordinal, never its hex digits.
        #[test]
        fn pool_addresses_always_match_decimal_ordinal(start in 1u64..60_000, count in 1u64..20) {
            let pool = IpPool::new("2001:db8::", start, count);
            for offset in 0..count {
                let ordinal = start + offset;
                let expected: Ipv6Addr = format!("2001:db8::{ordinal}").parse().unwrap();
                prop_assert!(pool.record_for(expected).is_some(), "missing expected address 2001:db8::{}", ordinal);
            }
        }
    }
}
