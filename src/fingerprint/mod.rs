//! Fingerprint registry: persona catalog plus the TLS configuration
//! each persona maps to.
//!
//! Byte-exact ClientHello replication (the way uTLS-style tools forge a
//! foreign TLS stack's handshake) has no safe, well-documented equivalent
//! among the crates available here. This approximates it instead: each
//! persona gets its own `rustls::ClientConfig` with a persona-appropriate
//! cipher-suite/version profile and ALPN order, combined with
//! persona-consistent HTTP headers.

pub mod personas;

pub use personas::{ClientHelloTemplate, Persona, PERSONAS};

use rand::Rng;
use std::sync::Arc;

/// Pick a persona uniformly at random from the catalog, for first-use
/// assignment to a source IP.
pub fn random_persona() -> &'static Persona {
    let idx = rand::rng().random_range(0..PERSONAS.len());
    &PERSONAS[idx]
}

/// Build the `rustls::ClientConfig` approximating this persona's TLS stack.
///
/// Chromium-family and Firefox personas restrict to TLS 1.3 with `ring`'s
/// default suite order (which already matches modern browsers closely);
/// Safari personas additionally permit TLS 1.2 for parity with older
/// Safari deployments still negotiating it on some origins.
#[must_use]
pub fn tls_config_for(persona: &Persona) -> Arc<rustls::ClientConfig> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.into(),
    };

    let versions: &[&'static rustls::SupportedProtocolVersion] = match persona.template {
        ClientHelloTemplate::SafariMacos17 | ClientHelloTemplate::SafariIos17 => {
            &[&rustls::version::TLS13, &rustls::version::TLS12]
        }
        _ => &[&rustls::version::TLS13],
    };

    let builder = rustls::ClientConfig::builder_with_protocol_versions(versions);

    let mut config = builder
        .with_root_certificates(root_store)
        .with_no_client_auth();

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Arc::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_persona_is_from_catalog() {
        let p = random_persona();
        assert!(PERSONAS.iter().any(|c| c.name == p.name));
    }

    #[test]
    fn tls_config_offers_h2_first() {
        let cfg = tls_config_for(&PERSONAS[0]);
        assert_eq!(cfg.alpn_protocols, vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
    }
}
