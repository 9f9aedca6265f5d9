//! Quadsync core library — configuration and quadlet domain logic.
//!
//! Public API surface:
//! - [`config`] — YAML configuration schema, loading, validation
//! - [`quadlet`] — quadlet classification and unit-name derivation
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod quadlet;

pub use config::{Config, RestartPolicy};
pub use error::ConfigError;
