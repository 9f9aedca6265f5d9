//! Error types for quadsync-systemd.

use thiserror::Error;

/// All errors that can arise from service-manager operations.
#[derive(Debug, Error)]
pub enum SystemdError {
    /// The command could not be spawned at all.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A command exited non-zero; `detail` carries its combined output.
    #[error("{command} failed: {detail}")]
    Command { command: &'static str, detail: String },

    /// The operation was cancelled before completion.
    #[error("systemd operation cancelled")]
    Cancelled,
}
