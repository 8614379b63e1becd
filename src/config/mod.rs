//! Configuration for the egress fleet.
//!
//! [`Config`] is built via [`ConfigBuilder`], which seeds itself from
//! [`defaults`] and can then be overridden from the process environment via
//! [`ConfigBuilder::apply_env`].

pub mod builder;
pub mod defaults;
pub mod env;
pub mod types;

pub use builder::ConfigBuilder;
pub use types::Config;

impl Config {
    /// Build a [`Config`] from defaults overridden by `FPFLEET_*` environment
    /// variables.
    ///
    /// # Errors
    /// Returns [`crate::error::ConfigError`] if the resulting values fail
    /// validation (see [`ConfigBuilder::build`]).
    pub fn from_env() -> Result<Self, crate::error::ConfigError> {
        ConfigBuilder::new().apply_env().build()
    }
}
