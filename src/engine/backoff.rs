//! Backoff policy per outcome class.

use std::time::Duration;

use super::outcome::Outcome;

/// Exponential backoff for the given outcome and zero-indexed attempt
/// number, honoring a `Retry-After` header when the outcome carries one.
#[must_use]
pub fn delay_for(base: Duration, attempt: u32, outcome: &Outcome) -> Duration {
    match outcome {
        Outcome::RateLimited {
            retry_after_secs: Some(secs),
        } => Duration::from_secs(*secs),
        Outcome::RateLimited {
            retry_after_secs: None,
        } => base.saturating_mul(1 << (attempt + 2).min(20)),
        Outcome::ServiceUnavailable => base.saturating_mul(1 << (attempt + 1).min(20)),
        Outcome::Network | Outcome::Timeout | Outcome::ServerError { .. } => {
            base.saturating_mul(1 << attempt.min(20))
        }
        Outcome::ForbiddenFirstAttempt | Outcome::Terminal { .. } | Outcome::ForbiddenTerminal => {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_header_takes_precedence() {
        let outcome = Outcome::RateLimited { retry_after_secs: Some(2) };
        assert_eq!(delay_for(Duration::from_millis(250), 0, &outcome), Duration::from_secs(2));
    }

    #[test]
    fn rate_limited_without_header_uses_longer_backoff() {
        let outcome = Outcome::RateLimited { retry_after_secs: None };
        let standard = Outcome::Network;
        assert!(
            delay_for(Duration::from_millis(250), 0, &outcome)
                > delay_for(Duration::from_millis(250), 0, &standard)
        );
    }

    #[test]
    fn forced_refresh_retry_has_no_backoff() {
        assert_eq!(
            delay_for(Duration::from_millis(250), 0, &Outcome::ForbiddenFirstAttempt),
            Duration::ZERO
        );
    }
}
