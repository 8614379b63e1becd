//! Closed error taxonomy for the egress engine.
//!
//! Every terminal failure the engine can return to a caller is one of the
//! [`ErrorKind`] variants below. Transient outcomes absorbed by the retry
//! loop never reach this type; only exhausted or unrecoverable conditions
//! do.

use thiserror::Error;

/// Terminal error kinds surfaced to callers of [`crate::engine::Engine::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad URL, disallowed host, or malformed source IP.
    Validation,
    /// The source IP's circuit breaker is currently open.
    CircuitOpen,
    /// Deadline exceeded after all retries.
    Timeout,
    /// Connect/TLS/read failure after all retries.
    Network,
    /// 429 exhausted the retry budget.
    RateLimited,
    /// 503 exhausted the retry budget.
    Unavailable,
    /// Other 5xx exhausted the retry budget.
    ServerError,
    /// 403 after the one forced-refresh retry.
    Forbidden,
    /// Admission rejected because the janitor is draining the process.
    ShuttingDown,
    /// The dispatcher's bounded submit queue was full.
    QueueFull,
}

impl ErrorKind {
    /// Stable lowercase token used in telemetry and `/health` error breakdowns.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::CircuitOpen => "circuit_open",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::ServerError => "server_error",
            Self::Forbidden => "forbidden",
            Self::ShuttingDown => "shutting_down",
            Self::QueueFull => "queue_full",
        }
    }

    /// HTTP status the `/proxy` adapter maps this kind to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::CircuitOpen | Self::Unavailable | Self::ShuttingDown | Self::QueueFull => 503,
            Self::Timeout | Self::Network => 502,
            Self::RateLimited => 429,
            Self::ServerError | Self::Forbidden => 502,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crate-wide error type. Carries a classification plus a human-readable
/// message; the classification is what callers and the circuit breaker act
/// on, the message is for logs. `status` is the real HTTP status the origin
/// returned, when one was actually received — `None` for transport-level
/// failures (timeout, connect/TLS error) that never got a response.
#[derive(Debug, Error, Clone)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl FetchError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Attach the origin's real HTTP status, when one was received.
    #[must_use]
    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    /// The status `/proxy` should surface to its caller: the origin's real
    /// status when one was observed, falling back to the generic mapping
    /// for this error's kind otherwise.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.status.unwrap_or_else(|| self.kind.http_status())
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn circuit_open(ip: std::net::Ipv6Addr) -> Self {
        Self::new(ErrorKind::CircuitOpen, format!("circuit open for {ip}"))
    }

    #[must_use]
    pub fn shutting_down() -> Self {
        Self::new(ErrorKind::ShuttingDown, "server is draining in-flight requests")
    }

    #[must_use]
    pub fn queue_full() -> Self {
        Self::new(ErrorKind::QueueFull, "dispatcher submit queue is at capacity")
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Configuration-time errors, kept distinct from runtime [`FetchError`] so a
/// bad `Config` can never be silently coerced into a fetch outcome.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_prefers_the_real_origin_status() {
        let err = FetchError::new(ErrorKind::Forbidden, "exhausted after 2 attempts").with_status(Some(403));
        assert_eq!(err.http_status(), 403);
    }

    #[test]
    fn http_status_falls_back_to_the_kind_mapping_without_a_real_status() {
        let err = FetchError::new(ErrorKind::Network, "connect failed");
        assert_eq!(err.status, None);
        assert_eq!(err.http_status(), ErrorKind::Network.http_status());
    }
}
