//! Origin whitelist and session-requirement checks.
//!
//! The engine is only willing to contact a small, closed set of hostnames.
//! This module is the single place that answers "is this host allowed" and
//! "does this host require a cookie session", both driven by
//! [`crate::config::Config`].

use crate::config::Config;
use crate::error::FetchError;
use url::Url;

/// A parsed, whitelist-checked target.
#[derive(Debug, Clone)]
pub struct Target {
    pub url: Url,
    pub host: String,
    pub requires_session: bool,
}

/// Parse and validate a target URL against the configured origin whitelist.
///
/// # Errors
/// Returns [`FetchError::validation`] if the URL doesn't parse, isn't
/// `https`, has no host, or its host isn't in `config.origin_whitelist()`.
pub fn validate(url_str: &str, config: &Config) -> Result<Target, FetchError> {
    let url = Url::parse(url_str)
        .map_err(|e| FetchError::validation(format!("invalid URL: {e}")))?;

    if url.scheme() != "https" {
        return Err(FetchError::validation("only https URLs are permitted"));
    }

    let host = url
        .host_str()
        .ok_or_else(|| FetchError::validation("URL has no host"))?
        .to_string();

    if !config.origin_whitelist().iter().any(|h| h == &host) {
        return Err(FetchError::validation(format!(
            "host {host} is not in the origin whitelist"
        )));
    }

    let requires_session = config
        .session_required_hosts()
        .iter()
        .any(|h| h == &host);

    Ok(Target {
        url,
        host,
        requires_session,
    })
}

/// Whether `cookie_domain` applies to `target_host`: exact match, or
/// `.example.com`-style suffix match.
#[must_use]
pub fn domain_matches(cookie_domain: &str, target_host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.');
    target_host == cookie_domain || target_host.ends_with(&format!(".{cookie_domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn config() -> Config {
        ConfigBuilder::new().build().expect("defaults are valid")
    }

    #[test]
    fn accepts_whitelisted_host() {
        let target = validate("https://kh.example.invalid/data", &config()).unwrap();
        assert_eq!(target.host, "kh.example.invalid");
        assert!(target.requires_session);
    }

    #[test]
    fn rejects_non_whitelisted_host() {
        assert!(validate("https://evil.invalid/data", &config()).is_err());
    }

    #[test]
    fn rejects_non_https() {
        assert!(validate("http://kh.example.invalid/data", &config()).is_err());
    }

    #[test]
    fn static_host_has_no_session_requirement() {
        let target = validate("https://static.earth.example.invalid/x", &config()).unwrap();
        assert!(!target.requires_session);
    }

    #[test]
    fn domain_match_handles_suffix() {
        assert!(domain_matches(".example.invalid", "kh.example.invalid"));
        assert!(domain_matches("kh.example.invalid", "kh.example.invalid"));
        assert!(!domain_matches("other.invalid", "kh.example.invalid"));
    }
}
