//! Janitor & lifecycle: periodic reclamation of idle per-IP state, plus
//! the graceful-shutdown drain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::binding::BindingCache;
use crate::dispatcher::Dispatcher;
use crate::telemetry::Stats;

/// Periodic sweep that reclaims bindings idle beyond the configured
/// inactivity threshold. Personas and pool statistics are untouched — only
/// the session, client, and health record for an idle IP are dropped.
pub struct Janitor {
    bindings: Arc<BindingCache>,
    interval: Duration,
    inactivity_threshold: Duration,
    shutting_down: Arc<AtomicBool>,
}

impl Janitor {
    #[must_use]
    pub fn new(
        bindings: Arc<BindingCache>,
        interval: Duration,
        inactivity_threshold: Duration,
        shutting_down: Arc<AtomicBool>,
    ) -> Self {
        Self {
            bindings,
            interval,
            inactivity_threshold,
            shutting_down,
        }
    }

    /// Spawn the sweep loop; returns a handle the caller can abort on
    /// shutdown.
    #[must_use]
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.shutting_down.load(Ordering::Acquire) {
                break;
            }
            let reclaimed = self.bindings.reclaim_idle(self.inactivity_threshold);
            if !reclaimed.is_empty() {
                info!(count = reclaimed.len(), "janitor reclaimed idle bindings");
            }
        }
    }
}

/// Set the shutdown flag (so the engine starts rejecting new admissions),
/// then wait up to `grace` for in-flight work to drain before returning.
/// Final statistics are logged once, regardless of whether the drain
/// completed cleanly or the grace period elapsed first.
pub async fn drain(
    shutting_down: &AtomicBool,
    grace: Duration,
    dispatcher: &Dispatcher,
    worker_concurrency: usize,
    stats: &Stats,
) {
    shutting_down.store(true, Ordering::Release);
    info!("shutdown signal received; draining in-flight requests");

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if dispatcher.available_slots() >= worker_concurrency && dispatcher.queued_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let snapshot = stats.snapshot();
    info!(
        total = snapshot.total_requests,
        success = snapshot.success_requests,
        failed = snapshot.failed_requests,
        "final statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn idle_bindings_are_reclaimed() {
        let bindings = Arc::new(BindingCache::new(0.8, 20, Duration::from_secs(300)));
        let ip: std::net::Ipv6Addr = "2001:db8::1".parse().unwrap();
        bindings.get_or_create(ip);
        assert_eq!(bindings.len(), 1);

        let reclaimed = bindings.reclaim_idle(Duration::from_millis(0));
        assert_eq!(reclaimed, vec![ip]);
        assert_eq!(bindings.len(), 0);
    }
}
