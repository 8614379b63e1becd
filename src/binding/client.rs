//! Constructs the reusable HTTP/2 client for one (source IP, persona) pair.

use std::net::Ipv6Addr;
use std::time::Duration;

use crate::fingerprint::{tls_config_for, Persona};

/// Build a `reqwest::Client` that dials from `ip`, offers ALPN `h2,
/// http/1.1`, and performs its TLS handshake with `persona`'s approximated
/// ClientHello. Idle-ping and read-idle timeouts keep long-lived HTTP/2
/// connections warm while dropping dead ones.
///
/// # Panics
/// Panics if the underlying `reqwest::ClientBuilder` fails to build, which
/// only happens on a malformed TLS backend configuration.
#[must_use]
pub fn build_client(ip: Ipv6Addr, persona: &Persona) -> reqwest::Client {
    let tls_config = tls_config_for(persona);

    reqwest::Client::builder()
        .local_address(std::net::IpAddr::V6(ip))
        .use_preconfigured_tls((*tls_config).clone())
        .http2_keep_alive_interval(Duration::from_secs(30))
        .http2_keep_alive_timeout(Duration::from_secs(10))
        .http2_keep_alive_while_idle(true)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(persona.user_agent)
        .build()
        .expect("reqwest client with preconfigured TLS must build")
}
