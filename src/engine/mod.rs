//! Egress request engine: the state machine where most of the fetch
//! admission, retry, and classification logic lives.

pub mod backoff;
pub mod outcome;

use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::binding::{BindingCache, DEFAULT_KEY};
use crate::config::Config;
use crate::error::{ErrorKind, FetchError, FetchResult};
use crate::fingerprint::Persona;
use crate::ip_pool::{IpPool, Selection};
use crate::origin::{self, Target};
use crate::session::{parse_set_cookie_headers, Cookie};
use crate::telemetry::{EventBus, RequestEvent, Stats};

use outcome::Outcome;

/// Caller-supplied fetch options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
    pub ipv6: Option<Ipv6Addr>,
}

/// Output of one completed fetch.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source_ip: Ipv6Addr,
    pub persona: &'static str,
}

pub struct Engine {
    pool: Arc<IpPool>,
    bindings: Arc<BindingCache>,
    config: Arc<Config>,
    refresh_semaphore: Arc<tokio::sync::Semaphore>,
    stats: Arc<Stats>,
    events: Arc<EventBus>,
    shutting_down: Arc<AtomicBool>,
}

impl Engine {
    #[must_use]
    pub fn new(
        pool: Arc<IpPool>,
        bindings: Arc<BindingCache>,
        config: Arc<Config>,
        stats: Arc<Stats>,
        events: Arc<EventBus>,
        shutting_down: Arc<AtomicBool>,
    ) -> Self {
        let refresh_semaphore = Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_refresh()));
        Self {
            pool,
            bindings,
            config,
            refresh_semaphore,
            stats,
            events,
            shutting_down,
        }
    }

    #[must_use]
    pub fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<IpPool> {
        &self.pool
    }

    #[must_use]
    pub fn bindings(&self) -> &Arc<BindingCache> {
        &self.bindings
    }

    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    #[must_use]
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<RequestEvent> {
        self.events.subscribe()
    }

    /// Execute one fetch job end to end. `job_id` is supplied by the caller
    /// (the dispatcher) so that queue-wait time can be included in the
    /// emitted telemetry event.
    pub async fn fetch(
        &self,
        job_id: Uuid,
        url: &str,
        opts: FetchOptions,
        queue_wait: Duration,
    ) -> FetchResult<FetchResponse> {
        let started = Instant::now();
        let result = self.fetch_inner(url, &opts).await;

        match &result {
            Ok(resp) => {
                self.stats.record_success();
                self.events.publish(RequestEvent {
                    job_id,
                    url: url.to_string(),
                    source_ip: resp.source_ip,
                    status: Some(resp.status),
                    duration_ms: started.elapsed().as_millis() as u64,
                    response_size: resp.body.len(),
                    wait_ms: queue_wait.as_millis() as u64,
                    error_kind: None,
                });
            }
            Err((ip, err)) => {
                self.stats.record_failure(err.kind);
                self.events.publish(RequestEvent::error(
                    job_id,
                    url.to_string(),
                    *ip,
                    queue_wait,
                    started.elapsed(),
                    err,
                ));
            }
        }
        result.map_err(|(_, err)| err)
    }

    /// Same as `fetch`'s body, but pairs every error with the source IP that
    /// was actually selected and used for the attempt(s) — `DEFAULT_KEY`
    /// only for the validation/shutdown paths that never reach selection.
    async fn fetch_inner(&self, url: &str, opts: &FetchOptions) -> Result<FetchResponse, (Ipv6Addr, FetchError)> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err((DEFAULT_KEY, FetchError::shutting_down()));
        }

        let target = origin::validate(url, &self.config).map_err(|e| (DEFAULT_KEY, e))?;

        let ip = match opts.ipv6 {
            Some(ip) => ip,
            None => self.pool.select(Selection::HealthyNext {
                failure_rate_threshold: self.config.healthy_failure_rate_threshold(),
                latency_threshold_ms: self.config.healthy_latency_threshold_ms(),
                warmup_requests: self.config.healthy_warmup_requests(),
            }),
        };

        let binding = self.bindings.get_or_create(ip);
        binding.health.admit(ip).await.map_err(|e| (ip, e))?;

        if target.requires_session {
            self.ensure_session_fresh(ip, &binding, &target).await;
        }

        let timeout = opts.timeout.unwrap_or_else(|| self.config.request_timeout());
        let deadline = Instant::now() + timeout;
        let max_retries = self.config.max_retries();
        let base_delay = self.config.base_retry_delay();

        let mut attempt: u32 = 0;
        let mut seen_403 = false;

        loop {
            if Instant::now() >= deadline {
                self.pool.record_request(ip, false, timeout.as_millis() as u64);
                binding.health.record(ip, false).await;
                return Err((ip, FetchError::new(ErrorKind::Timeout, "deadline exceeded before attempt")));
            }

            let cookies = if target.requires_session {
                binding.session.cookies_for(&target.host).await
            } else {
                Vec::new()
            };

            let request = build_request(
                &binding.client,
                &target,
                binding.persona,
                &cookies,
                &self.config,
                &opts.headers,
            );

            let attempt_started = Instant::now();
            let send_result = tokio::time::timeout(deadline.saturating_duration_since(Instant::now()), request.send()).await;

            let outcome = match send_result {
                Err(_elapsed) => Outcome::Timeout,
                Ok(Err(transport_err)) => Outcome::classify_transport_error(&transport_err),
                Ok(Ok(response)) => {
                    let status = response.status().as_u16();
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok());

                    let classified = Outcome::classify_status(
                        status,
                        target.requires_session,
                        target.requires_session,
                        seen_403,
                        retry_after,
                    );

                    if let Outcome::Terminal { .. } = classified {
                        let latency = attempt_started.elapsed().as_millis() as u64;
                        self.pool.record_request(ip, true, latency);
                        binding.health.record(ip, true).await;

                        let headers = response.headers().clone();
                        let body = response
                            .bytes()
                            .await
                            .map_err(|e| (ip, FetchError::new(ErrorKind::Network, format!("body read failed: {e}"))))?;

                        return Ok(FetchResponse {
                            status,
                            headers,
                            body,
                            source_ip: ip,
                            persona: binding.persona.name,
                        });
                    }

                    classified
                }
            };

            if let Outcome::ForbiddenFirstAttempt = &outcome {
                seen_403 = true;
                binding.session.invalidate().await;
                self.ensure_session_fresh(ip, &binding, &target).await;
                // Special retry: does not consume an exponential slot.
                continue;
            }

            let is_final_attempt = attempt >= max_retries;

            if outcome.is_terminal() || is_final_attempt {
                self.pool.record_request(ip, false, attempt_started.elapsed().as_millis() as u64);
                binding.health.record(ip, false).await;
                let kind = outcome.error_kind().unwrap_or(ErrorKind::Network);
                let status = outcome.status();
                return Err((
                    ip,
                    FetchError::new(kind, format!("exhausted after {} attempts", attempt + 1)).with_status(status),
                ));
            }

            self.pool.record_request(ip, false, attempt_started.elapsed().as_millis() as u64);
            binding.health.record(ip, false).await;

            let delay = backoff::delay_for(base_delay, attempt, &outcome);
            let remaining = deadline.saturating_duration_since(Instant::now());
            let sleep_for = delay.min(remaining);
            if sleep_for > Duration::ZERO {
                tokio::time::sleep(sleep_for).await;
            }
            attempt += 1;
        }
    }

    async fn ensure_session_fresh(&self, ip: Ipv6Addr, binding: &crate::binding::Binding, target: &Target) {
        let client = binding.client.clone();
        let persona = binding.persona;
        let config = Arc::clone(&self.config);

        let refresh_result = binding
            .session
            .ensure_fresh(&self.refresh_semaphore, || {
                bootstrap_with_retries(client, persona, config)
            })
            .await;

        if let Err(err) = refresh_result {
            warn!(%ip, host = %target.host, error = %err, "session refresh failed; proceeding with stale cookies");
        }
    }
}

async fn bootstrap_with_retries(
    client: reqwest::Client,
    persona: &'static Persona,
    config: Arc<Config>,
) -> FetchResult<Vec<Cookie>> {
    let home_url = format!("https://{}/web/", config.home_origin());
    let mut last_err = None;

    for attempt in 0..3u32 {
        let request = client
            .get(&home_url)
            .header(reqwest::header::USER_AGENT, persona.user_agent)
            .header(reqwest::header::ACCEPT, persona.navigation_accept)
            .header(reqwest::header::ACCEPT_LANGUAGE, persona.accept_language)
            .timeout(config.session_refresh_timeout());

        match request.send().await {
            Ok(response) => {
                let set_cookie_headers: Vec<String> = response
                    .headers()
                    .get_all(reqwest::header::SET_COOKIE)
                    .iter()
                    .filter_map(|v| v.to_str().ok().map(str::to_string))
                    .collect();
                return Ok(parse_set_cookie_headers(&set_cookie_headers, config.home_origin()));
            }
            Err(e) => {
                debug!(attempt, error = %e, "bootstrap request failed, will retry");
                last_err = Some(e);
            }
        }
    }

    Err(FetchError::new(
        ErrorKind::Network,
        format!(
            "session bootstrap failed after 3 attempts: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        ),
    ))
}

fn build_request(
    client: &reqwest::Client,
    target: &Target,
    persona: &'static Persona,
    cookies: &[Cookie],
    config: &Config,
    extra_headers: &HeaderMap,
) -> reqwest::RequestBuilder {
    let mut request = client
        .get(target.url.clone())
        .header(reqwest::header::USER_AGENT, persona.user_agent)
        .header(reqwest::header::ACCEPT, "*/*")
        .header(reqwest::header::ACCEPT_ENCODING, "gzip, deflate, br")
        .header(reqwest::header::ACCEPT_LANGUAGE, persona.accept_language)
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .header(HeaderName::from_static("pragma"), HeaderValue::from_static("no-cache"))
        .header(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("empty"))
        .header(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("cors"))
        .header(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("cross-site"));

    if let (Some(sec_ch_ua), Some(sec_ch_ua_platform)) = (persona.sec_ch_ua, persona.sec_ch_ua_platform) {
        request = request
            .header(HeaderName::from_static("sec-ch-ua"), HeaderValue::from_static(sec_ch_ua))
            .header(
                HeaderName::from_static("sec-ch-ua-platform"),
                HeaderValue::from_static(sec_ch_ua_platform),
            );
    }

    if rand::rng().random_bool(0.5) {
        request = request.header(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    }

    if target.requires_session {
        let referer = format!("https://{}/", config.home_origin());
        request = request
            .header(reqwest::header::REFERER, referer)
            .header(reqwest::header::ORIGIN, format!("https://{}", config.home_origin()));
    }

    if !cookies.is_empty() {
        let cookie_header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        request = request.header(reqwest::header::COOKIE, cookie_header);
    }

    for (name, value) in extra_headers.iter() {
        request = request.header(name.clone(), value.clone());
    }

    request
}
