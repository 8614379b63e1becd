//! The `"request"` telemetry event stream.
//!
//! One output channel the engine writes to non-blockingly; zero or more
//! consumers may subscribe. `tokio::sync::broadcast` drops the oldest
//! buffered event under load rather than blocking the sender, so a slow
//! or absent consumer never back-pressures the hot path.

use std::net::Ipv6Addr;
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::FetchError;

/// Emitted once per completed fetch job.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RequestEvent {
    pub job_id: Uuid,
    pub url: String,
    pub source_ip: Ipv6Addr,
    pub status: Option<u16>,
    pub duration_ms: u64,
    pub response_size: usize,
    pub wait_ms: u64,
    pub error_kind: Option<&'static str>,
}

impl RequestEvent {
    #[must_use]
    pub fn error(
        job_id: Uuid,
        url: String,
        source_ip: Ipv6Addr,
        wait: Duration,
        duration: Duration,
        err: &FetchError,
    ) -> Self {
        Self {
            job_id,
            url,
            source_ip,
            status: err.status,
            duration_ms: duration.as_millis() as u64,
            response_size: 0,
            wait_ms: wait.as_millis() as u64,
            error_kind: Some(err.kind.as_str()),
        }
    }
}

/// Non-blocking fan-out of [`RequestEvent`]s. The core doesn't depend on
/// anyone subscribing.
pub struct EventBus {
    sender: broadcast::Sender<RequestEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RequestEvent> {
        self.sender.subscribe()
    }

    /// Publish without blocking. A send error only happens when there are
    /// no subscribers, which is an expected, non-fatal state.
    pub fn publish(&self, event: RequestEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
