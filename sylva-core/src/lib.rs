//! # sylva-core
//!
//! Shared runtime plumbing for the Sylva data platform: layered configuration
//! ([`SylvaConfig`]) and `tracing` subscriber setup ([`init_tracing`]).

pub mod config;
mod tracing_setup;

pub use config::{ConfigError, ConfigProperties, ConfigValue, FromConfigValue, SylvaConfig};
pub use tracing_setup::{init_tracing, DEFAULT_FILTER};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::config::{ConfigError, ConfigProperties, ConfigValue, PropertyMeta, SylvaConfig};
    pub use crate::init_tracing;
}
