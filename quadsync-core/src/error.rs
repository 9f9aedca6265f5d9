//! Error types for quadsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected schema.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An `${VAR}` reference in a config value did not resolve.
    #[error("cannot expand '{value}': {source}")]
    Expand {
        value: String,
        #[source]
        source: shellexpand::LookupError<std::env::VarError>,
    },

    /// A semantic validation rule was violated.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
