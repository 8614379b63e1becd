//! Per-IP binding cache.
//!
//! Four keyed maps collapsed into one: for each source IP, memoizes the
//! persona assigned on first use, the reusable HTTP/2 client, the cookie
//! session, and a circuit-breaker health record. Lookup is get-or-create
//! with no cross-IP locking — creation races for the same IP are resolved
//! by `DashMap::entry`'s first-writer-wins semantics.

pub mod client;

use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use crate::error::FetchError;
use crate::fingerprint::{random_persona, Persona};
use crate::session::CookieSession;

/// Per-IP failure-rate circuit breaker.
///
/// Opens once a minimum request window has been observed and the failure
/// rate over that window exceeds the configured threshold — not on
/// consecutive failures alone.
#[derive(Debug)]
pub struct HealthRecord {
    total: AtomicU64,
    failures: AtomicU64,
    open: AtomicBool,
    opened_at: AsyncMutex<Option<Instant>>,
    failure_threshold: f64,
    min_window: u64,
    recovery_time: Duration,
}

impl HealthRecord {
    fn new(failure_threshold: f64, min_window: u32, recovery_time: Duration) -> Self {
        Self {
            total: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            open: AtomicBool::new(false),
            opened_at: AsyncMutex::new(None),
            failure_threshold,
            min_window: u64::from(min_window),
            recovery_time,
        }
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn observed_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Admission check: error if the circuit is open and recovery hasn't
    /// elapsed yet. Half-opens (permits exactly one probe) once recovery
    /// has elapsed, without flipping the flag until that probe's outcome is
    /// recorded.
    pub async fn admit(&self, ip: Ipv6Addr) -> Result<(), FetchError> {
        if !self.is_open() {
            return Ok(());
        }
        let opened_at = *self.opened_at.lock().await;
        match opened_at {
            Some(opened) if opened.elapsed() >= self.recovery_time => Ok(()),
            _ => Err(FetchError::circuit_open(ip)),
        }
    }

    /// Record a terminal outcome and update breaker state.
    pub async fn record(&self, ip: Ipv6Addr, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        let total = self.total.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let failure_rate = failures as f64 / total as f64;

        if self.is_open() {
            if success {
                // Successful half-open probe: close the circuit.
                self.open.store(false, Ordering::Release);
                *self.opened_at.lock().await = None;
                info!(%ip, "circuit closed after successful recovery probe");
            } else {
                // Failed probe: stay open, restart the recovery clock.
                *self.opened_at.lock().await = Some(Instant::now());
            }
            return;
        }

        if total >= self.min_window && failure_rate > self.failure_threshold {
            self.open.store(true, Ordering::Release);
            *self.opened_at.lock().await = Some(Instant::now());
            tracing::warn!(%ip, failure_rate, total, "circuit opened");
        }
    }
}

/// The tuple (persona, client, session, health) associated with a source IP
/// for the life of its usage.
pub struct Binding {
    pub persona: &'static Persona,
    pub client: reqwest::Client,
    pub session: Arc<CookieSession>,
    pub health: Arc<HealthRecord>,
    last_access_millis: AtomicU64,
}

impl Binding {
    fn fresh(ip: Ipv6Addr, failure_threshold: f64, min_window: u32, recovery_time: Duration) -> Self {
        let persona = random_persona();
        Self {
            persona,
            client: client::build_client(ip, persona),
            session: Arc::new(CookieSession::new()),
            health: Arc::new(HealthRecord::new(failure_threshold, min_window, recovery_time)),
            last_access_millis: AtomicU64::new(0),
        }
    }

    pub fn touch(&self, epoch_start: Instant) {
        self.last_access_millis
            .store(epoch_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    #[must_use]
    pub fn idle_for(&self, epoch_start: Instant) -> Duration {
        let last = self.last_access_millis.load(Ordering::Relaxed);
        epoch_start.elapsed().saturating_sub(Duration::from_millis(last))
    }
}

/// Interned key for the "no explicit source IP" case, so the per-IP maps
/// stay total. `::1` is never provisioned by [`crate::ip_pool::IpPool`], so
/// it can't collide with a real pool address.
pub const DEFAULT_KEY: Ipv6Addr = Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1);

pub struct BindingCache {
    bindings: DashMap<Ipv6Addr, Arc<Binding>>,
    epoch_start: Instant,
    failure_threshold: f64,
    min_window: u32,
    recovery_time: Duration,
}

impl BindingCache {
    #[must_use]
    pub fn new(failure_threshold: f64, min_window: u32, recovery_time: Duration) -> Self {
        Self {
            bindings: DashMap::new(),
            epoch_start: Instant::now(),
            failure_threshold,
            min_window,
            recovery_time,
        }
    }

    /// Get the binding for `ip`, creating it with a freshly (randomly)
    /// assigned persona if this is the first use. First-writer-wins: a
    /// losing concurrent creator discards its candidate.
    pub fn get_or_create(&self, ip: Ipv6Addr) -> Arc<Binding> {
        let entry = self.bindings.entry(ip).or_insert_with(|| {
            Arc::new(Binding::fresh(
                ip,
                self.failure_threshold,
                self.min_window,
                self.recovery_time,
            ))
        });
        entry.touch(self.epoch_start);
        Arc::clone(entry.value())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Remove and return bindings idle beyond `threshold`, for the janitor.
    pub fn reclaim_idle(&self, threshold: Duration) -> Vec<Ipv6Addr> {
        let stale: Vec<Ipv6Addr> = self
            .bindings
            .iter()
            .filter(|entry| entry.value().idle_for(self.epoch_start) >= threshold)
            .map(|entry| *entry.key())
            .collect();
        for ip in &stale {
            self.bindings.remove(ip);
        }
        stale
    }

    /// Snapshot of every currently-bound `Arc<Binding>`, for `/health`
    /// aggregation.
    #[must_use]
    pub fn all_bindings(&self) -> Vec<Arc<Binding>> {
        self.bindings.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    #[must_use]
    pub fn persona_usage_counts(&self) -> std::collections::HashMap<&'static str, usize> {
        let mut counts = std::collections::HashMap::new();
        for entry in &self.bindings {
            *counts.entry(entry.value().persona.name).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persona_is_stable_across_lookups() {
        let cache = BindingCache::new(0.8, 20, Duration::from_secs(300));
        let ip: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let first = cache.get_or_create(ip);
        let second = cache.get_or_create(ip);
        assert_eq!(first.persona.name, second.persona.name);
    }

    #[tokio::test]
    async fn circuit_opens_past_threshold_and_window() {
        let health = HealthRecord::new(0.8, 20, Duration::from_millis(50));
        let ip: Ipv6Addr = "2001:db8::1".parse().unwrap();
        for _ in 0..20 {
            health.record(ip, false).await;
        }
        assert!(health.is_open());
        assert!(health.admit(ip).await.is_err());
    }

    #[tokio::test]
    async fn circuit_half_opens_after_recovery() {
        let health = HealthRecord::new(0.8, 20, Duration::from_millis(10));
        let ip: Ipv6Addr = "2001:db8::1".parse().unwrap();
        for _ in 0..20 {
            health.record(ip, false).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(health.admit(ip).await.is_ok());
        health.record(ip, true).await;
        assert!(!health.is_open());
    }
}
