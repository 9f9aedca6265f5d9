//! Error types for quadsync-server.

use std::path::PathBuf;

use thiserror::Error;

use quadsync_engine::EngineError;

/// All errors that can keep the webhook server from starting or serving.
///
/// Webhook *input* problems (bad signature, wrong method, malformed payload)
/// are HTTP responses, not errors; a running server never stops over them.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The webhook secret file could not be read.
    #[error("failed to read webhook secret {path}: {source}")]
    Secret {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mandatory pass before accepting requests failed; the server does
    /// not start.
    #[error("initial sync failed: {0}")]
    InitialSync(#[from] EngineError),

    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop died.
    #[error("webhook server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}
