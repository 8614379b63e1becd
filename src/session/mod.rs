//! Cookie session manager.
//!
//! One [`CookieSession`] per source IP. Refreshing is single-flight per IP
//! (a `tokio::sync::Mutex` serializes refreshers; a waiter that wins the
//! lock after another refresher just finished re-checks freshness and skips
//! redoing the work) and globally throttled via a process-wide
//! [`tokio::sync::Semaphore`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock, Semaphore};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::origin::domain_matches;

/// One cookie as returned by an origin's `Set-Cookie` header.
#[derive(Debug, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    /// `None` for session cookies, which are treated as expiring one hour
    /// from when they were received.
    pub expires: Option<Instant>,
}

const SESSION_COOKIE_LIFETIME: Duration = Duration::from_secs(3600);
const REFRESH_LEADING_WINDOW: Duration = Duration::from_secs(30);
const REFRESH_HARD_CEILING: Duration = Duration::from_secs(600);

#[derive(Debug, Default)]
struct SessionState {
    cookies: Vec<Cookie>,
    last_refresh: Option<Instant>,
}

impl SessionState {
    fn prune_expired(&mut self, now: Instant) {
        self.cookies.retain(|c| c.expires.is_none_or(|exp| exp > now));
    }

    fn earliest_expiry(&self) -> Option<Instant> {
        self.cookies.iter().filter_map(|c| c.expires).min()
    }

    fn needs_refresh(&self, now: Instant) -> bool {
        if self.cookies.is_empty() {
            return true;
        }
        if let Some(earliest) = self.earliest_expiry() {
            if earliest <= now + REFRESH_LEADING_WINDOW {
                return true;
            }
        }
        match self.last_refresh {
            None => true,
            Some(last) => now.duration_since(last) >= REFRESH_HARD_CEILING,
        }
    }
}

pub struct CookieSession {
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
    refresh_count: std::sync::atomic::AtomicU64,
}

impl CookieSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            refresh_lock: Mutex::new(()),
            refresh_count: std::sync::atomic::AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Cookies applicable to `target_host`, filtered by domain match.
    pub async fn cookies_for(&self, target_host: &str) -> Vec<Cookie> {
        let state = self.state.read().await;
        state
            .cookies
            .iter()
            .filter(|c| domain_matches(&c.domain, target_host))
            .cloned()
            .collect()
    }

    #[must_use]
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.cookies.is_empty()
    }

    #[must_use]
    pub async fn cookie_count(&self) -> usize {
        self.state.read().await.cookies.len()
    }

    #[must_use]
    pub async fn earliest_expiry(&self) -> Option<Instant> {
        self.state.read().await.earliest_expiry()
    }

    /// Force the next freshness check to require a refresh — used on a
    /// 403 that looks session-related.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.last_refresh = None;
    }

    /// Ensure the session is fresh, refreshing via `refresher` if needed.
    /// `refresher` performs the actual bootstrap request and returns the new
    /// cookie set; it's supplied by the engine because it needs the bound
    /// client, persona, and TLS handshake.
    ///
    /// Returns `Ok(true)` if a refresh happened, `Ok(false)` if the session
    /// was already fresh, or the refresher's error if a refresh was
    /// attempted and failed (the caller proceeds with stale cookies —
    /// refresh failures do not hard-fail the data request).
    pub async fn ensure_fresh<F, Fut>(
        &self,
        global_throttle: &Semaphore,
        refresher: F,
    ) -> Result<bool, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Cookie>, FetchError>>,
    {
        let now = Instant::now();
        {
            let mut state = self.state.write().await;
            state.prune_expired(now);
            if !state.needs_refresh(now) {
                return Ok(false);
            }
        }

        // Serialize refreshers for this IP.
        let _guard = self.refresh_lock.lock().await;

        // Another refresher may have already run while we waited.
        let now = Instant::now();
        {
            let mut state = self.state.write().await;
            state.prune_expired(now);
            if !state.needs_refresh(now) {
                return Ok(false);
            }
        }

        let _permit = global_throttle
            .acquire()
            .await
            .map_err(|_| FetchError::new(crate::error::ErrorKind::Unavailable, "refresh semaphore closed"))?;

        debug!("refreshing cookie session");
        let fresh_cookies = refresher().await?;

        let mut state = self.state.write().await;
        state.cookies = fresh_cookies;
        state.last_refresh = Some(Instant::now());
        self.refresh_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(true)
    }
}

impl Default for CookieSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `Set-Cookie` header values into [`Cookie`]s, applying the
/// session-cookie-as-one-hour rule.
#[must_use]
pub fn parse_set_cookie_headers(headers: &[String], default_domain: &str) -> Vec<Cookie> {
    let now = Instant::now();
    headers
        .iter()
        .filter_map(|raw| parse_one(raw, default_domain, now))
        .collect()
}

fn parse_one(raw: &str, default_domain: &str, now: Instant) -> Option<Cookie> {
    let mut parts = raw.split(';').map(str::trim);
    let (name, value) = parts.next()?.split_once('=')?;

    let mut domain = default_domain.to_string();
    let mut max_age: Option<i64> = None;
    let mut has_expires = false;

    for attr in parts {
        let mut kv = attr.splitn(2, '=');
        let key = kv.next().unwrap_or_default().trim().to_ascii_lowercase();
        let val = kv.next().map(str::trim);
        match key.as_str() {
            "domain" => {
                if let Some(v) = val {
                    domain = v.trim_start_matches('.').to_string();
                }
            }
            "max-age" => {
                if let Some(v) = val {
                    max_age = v.parse().ok();
                }
            }
            "expires" => has_expires = true,
            _ => {}
        }
    }

    let expires = if let Some(seconds) = max_age {
        Some(now + Duration::from_secs(seconds.max(0) as u64))
    } else if has_expires {
        // We don't do calendar parsing here; treat any `Expires`-bearing
        // cookie conservatively as a one-hour session cookie too, since the
        // exact instant doesn't change retrieval behavior within a process
        // lifetime this short-lived.
        Some(now + SESSION_COOKIE_LIFETIME)
    } else {
        Some(now + SESSION_COOKIE_LIFETIME)
    };

    Some(Cookie {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
        domain,
        expires,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_session_needs_refresh() {
        let session = CookieSession::new();
        let sem = Semaphore::new(1);
        let refreshed = session
            .ensure_fresh(&sem, || async {
                Ok(vec![Cookie {
                    name: "sid".into(),
                    value: "abc".into(),
                    domain: "example.invalid".into(),
                    expires: Some(Instant::now() + Duration::from_secs(3600)),
                }])
            })
            .await
            .unwrap();
        assert!(refreshed);
        assert!(!session.is_empty().await);
    }

    #[tokio::test]
    async fn fresh_session_skips_refresh() {
        let session = CookieSession::new();
        let sem = Semaphore::new(1);
        session
            .ensure_fresh(&sem, || async {
                Ok(vec![Cookie {
                    name: "sid".into(),
                    value: "abc".into(),
                    domain: "example.invalid".into(),
                    expires: Some(Instant::now() + Duration::from_secs(3600)),
                }])
            })
            .await
            .unwrap();

        let refreshed_again = session
            .ensure_fresh(&sem, || async { panic!("should not refresh twice") })
            .await
            .unwrap();
        assert!(!refreshed_again);
    }

    #[tokio::test]
    async fn invalidate_forces_next_refresh() {
        let session = CookieSession::new();
        let sem = Semaphore::new(1);
        session
            .ensure_fresh(&sem, || async {
                Ok(vec![Cookie {
                    name: "sid".into(),
                    value: "abc".into(),
                    domain: "example.invalid".into(),
                    expires: Some(Instant::now() + Duration::from_secs(3600)),
                }])
            })
            .await
            .unwrap();
        session.invalidate().await;
        let refreshed = session
            .ensure_fresh(&sem, || async {
                Ok(vec![Cookie {
                    name: "sid".into(),
                    value: "def".into(),
                    domain: "example.invalid".into(),
                    expires: Some(Instant::now() + Duration::from_secs(3600)),
                }])
            })
            .await
            .unwrap();
        assert!(refreshed);
    }

    #[test]
    fn domain_filtering_excludes_other_hosts() {
        let cookies = vec![
            Cookie {
                name: "a".into(),
                value: "1".into(),
                domain: "kh.example.invalid".into(),
                expires: None,
            },
            Cookie {
                name: "b".into(),
                value: "2".into(),
                domain: "other.invalid".into(),
                expires: None,
            },
        ];
        let matching: Vec<_> = cookies
            .iter()
            .filter(|c| domain_matches(&c.domain, "kh.example.invalid"))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].name, "a");
    }
}
