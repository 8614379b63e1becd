//! Static persona catalog for the fingerprint registry.

/// Closed enum of supported ClientHello templates. Each variant corresponds
/// to one real, versioned browser TLS stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientHelloTemplate {
    Chrome120Windows,
    Chrome120Macos,
    Chrome120Linux,
    Edge120Windows,
    Firefox121,
    SafariMacos17,
    SafariIos17,
}

impl ClientHelloTemplate {
    #[must_use]
    pub const fn is_chromium_family(&self) -> bool {
        matches!(
            self,
            Self::Chrome120Windows | Self::Chrome120Macos | Self::Chrome120Linux | Self::Edge120Windows
        )
    }
}

/// An immutable catalog entry pairing a ClientHello template with the HTTP
/// headers a real browser of that build sends.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: &'static str,
    pub template: ClientHelloTemplate,
    pub user_agent: &'static str,
    pub sec_ch_ua: Option<&'static str>,
    pub sec_ch_ua_platform: Option<&'static str>,
    pub accept_language: &'static str,
    pub navigation_accept: &'static str,
}

impl Persona {
    /// Invariant check: Chromium-family personas carry client-hints fields,
    /// Firefox/Safari/iOS ones don't.
    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.template.is_chromium_family()
            == (self.sec_ch_ua.is_some() && self.sec_ch_ua_platform.is_some())
    }
}

/// The full, ordered persona catalog. Order is stable so that `random`
/// selection is reproducible under a seeded RNG in tests.
pub static PERSONAS: &[Persona] = &[
    Persona {
        name: "chrome-120-windows",
        template: ClientHelloTemplate::Chrome120Windows,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        sec_ch_ua: Some(r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#),
        sec_ch_ua_platform: Some(r#""Windows""#),
        accept_language: "en-US,en;q=0.9",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    },
    Persona {
        name: "chrome-120-macos",
        template: ClientHelloTemplate::Chrome120Macos,
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        sec_ch_ua: Some(r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#),
        sec_ch_ua_platform: Some(r#""macOS""#),
        accept_language: "en-US,en;q=0.9",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    },
    Persona {
        name: "chrome-120-linux",
        template: ClientHelloTemplate::Chrome120Linux,
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        sec_ch_ua: Some(r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#),
        sec_ch_ua_platform: Some(r#""Linux""#),
        accept_language: "en-US,en;q=0.9",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    },
    Persona {
        name: "edge-120-windows",
        template: ClientHelloTemplate::Edge120Windows,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
        sec_ch_ua: Some(r#""Not_A Brand";v="8", "Chromium";v="120", "Microsoft Edge";v="120""#),
        sec_ch_ua_platform: Some(r#""Windows""#),
        accept_language: "en-US,en;q=0.9",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    },
    Persona {
        name: "firefox-121",
        template: ClientHelloTemplate::Firefox121,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
        accept_language: "en-US,en;q=0.5",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    },
    Persona {
        name: "safari-17-macos",
        template: ClientHelloTemplate::SafariMacos17,
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
        accept_language: "en-US,en;q=0.9",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    },
    Persona {
        name: "safari-17-ios",
        template: ClientHelloTemplate::SafariIos17,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
        accept_language: "en-US,en;q=0.9",
        navigation_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_nonempty_and_internally_consistent() {
        assert!(!PERSONAS.is_empty());
        for persona in PERSONAS {
            assert!(persona.is_consistent(), "{} violates client-hints invariant", persona.name);
        }
    }
}
