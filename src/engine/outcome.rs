//! Outcome classification for the engine's retry loop.

use crate::error::ErrorKind;

/// One network attempt's classified result.
#[derive(Debug)]
pub enum Outcome {
    /// 2xx/3xx/4xx other than 403/429: terminal, returned to the caller.
    Terminal { status: u16 },
    /// 403 on a data-origin request where a session was in use, seen for
    /// the first time this fetch: force a session refresh and retry once,
    /// off the exponential ladder.
    ForbiddenFirstAttempt,
    /// 403 seen again (or not eligible for the special retry): terminal
    /// failure.
    ForbiddenTerminal,
    RateLimited { retry_after_secs: Option<u64> },
    ServiceUnavailable,
    ServerError { status: u16 },
    Network,
    Timeout,
}

impl Outcome {
    #[must_use]
    pub fn classify_status(
        status: u16,
        is_data_host: bool,
        session_in_use: bool,
        seen_403_once_already: bool,
        retry_after_secs: Option<u64>,
    ) -> Self {
        match status {
            403 if is_data_host && session_in_use && !seen_403_once_already => {
                Self::ForbiddenFirstAttempt
            }
            403 if is_data_host && session_in_use => Self::ForbiddenTerminal,
            429 => Self::RateLimited { retry_after_secs },
            503 => Self::ServiceUnavailable,
            s if (500..600).contains(&s) => Self::ServerError { status: s },
            s => Self::Terminal { status: s },
        }
    }

    #[must_use]
    pub fn classify_transport_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network
        }
    }

    /// Whether this outcome ends the retry loop (no further attempts,
    /// regardless of remaining budget).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. } | Self::ForbiddenTerminal)
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Terminal { .. } | Self::ForbiddenFirstAttempt => None,
            Self::ForbiddenTerminal => Some(ErrorKind::Forbidden),
            Self::RateLimited { .. } => Some(ErrorKind::RateLimited),
            Self::ServiceUnavailable => Some(ErrorKind::Unavailable),
            Self::ServerError { .. } => Some(ErrorKind::ServerError),
            Self::Network => Some(ErrorKind::Network),
            Self::Timeout => Some(ErrorKind::Timeout),
        }
    }

    /// The real HTTP status the origin returned for this attempt, when one
    /// was received. `None` for transport failures that never got a
    /// response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Terminal { status } | Self::ServerError { status } => Some(*status),
            Self::ForbiddenFirstAttempt | Self::ForbiddenTerminal => Some(403),
            Self::RateLimited { .. } => Some(429),
            Self::ServiceUnavailable => Some(503),
            Self::Network | Self::Timeout => None,
        }
    }

    /// Whether this outcome counts as a success for circuit-breaker and
    /// pool-statistics purposes. Every terminal HTTP status (even 4xx other
    /// than 403/429) is a "success" in the sense that the origin was
    /// reached and answered — only transport failures and exhausted
    /// error-classes count as failures.
    #[must_use]
    pub fn counts_as_success(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_403_with_session_triggers_forced_refresh() {
        let outcome = Outcome::classify_status(403, true, true, false, None);
        assert!(matches!(outcome, Outcome::ForbiddenFirstAttempt));
    }

    #[test]
    fn second_403_is_terminal() {
        let outcome = Outcome::classify_status(403, true, true, true, None);
        assert!(matches!(outcome, Outcome::ForbiddenTerminal));
        assert!(outcome.is_terminal());
    }

    #[test]
    fn non_data_host_403_is_just_a_status() {
        let outcome = Outcome::classify_status(403, false, false, false, None);
        assert!(matches!(outcome, Outcome::Terminal { status: 403 }));
    }

    #[test]
    fn other_4xx_is_terminal_success() {
        let outcome = Outcome::classify_status(404, true, true, false, None);
        assert!(outcome.counts_as_success());
    }

    #[test]
    fn status_reports_the_real_code_for_every_response_backed_outcome() {
        assert_eq!(Outcome::classify_status(404, false, false, false, None).status(), Some(404));
        assert_eq!(Outcome::classify_status(403, true, true, true, None).status(), Some(403));
        assert_eq!(Outcome::classify_status(429, true, true, false, None).status(), Some(429));
        assert_eq!(Outcome::classify_status(503, true, true, false, None).status(), Some(503));
        assert_eq!(Outcome::classify_status(521, true, true, false, None).status(), Some(521));
    }

    #[test]
    fn status_is_none_for_transport_failures() {
        assert_eq!(Outcome::Network.status(), None);
        assert_eq!(Outcome::Timeout.status(), None);
    }
}
