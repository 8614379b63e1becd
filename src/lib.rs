//! A fingerprint-aware egress fetching fleet: retrieves resources from a
//! small whitelisted set of origins through a pool of source IPv6
//! addresses, presenting each origin a TLS handshake and HTTP behavior
//! matched to a real browser persona.

pub mod binding;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod ip_pool;
pub mod janitor;
pub mod origin;
pub mod server;
pub mod session;
pub mod telemetry;

pub use config::Config;
pub use engine::{Engine, FetchOptions, FetchResponse};
pub use error::{ErrorKind, FetchError, FetchResult};
