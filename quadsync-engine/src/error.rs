//! Error types for quadsync-engine.

use std::path::PathBuf;

use thiserror::Error;

use quadsync_git::GitError;
use quadsync_systemd::SystemdError;

/// All errors that can abort a reconciliation pass.
///
/// Restart failures never appear here: the engine demotes them to warnings
/// and reports the pass as successful.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Fetch or checkout of the source repository failed.
    #[error("failed to checkout repository: {0}")]
    Source(#[from] GitError),

    /// The effective source root is missing or not traversable.
    #[error("source directory unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Enumerating the source tree failed partway through.
    #[error("failed to discover source files at {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Hashing a source file failed.
    #[error("failed to hash {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The planner computed a destination outside the quadlet directory.
    #[error("destination escapes quadlet directory: {dest}")]
    PathEscape { dest: PathBuf },

    /// A per-file write, rename, or unlink failed while applying the plan.
    #[error("failed to apply {op} for {dest}: {source}")]
    Apply {
        op: &'static str,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The quadlet generator rejected the post-apply destination tree.
    #[error("quadlet validation failed: {0}")]
    Validation(#[source] SystemdError),

    /// The persisted manifest exists but does not parse. Recovered by the
    /// engine (fresh sync); surfaces only as a warning.
    #[error("state file corrupt at {path}: {source}")]
    StateCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest could not be persisted.
    #[error("failed to write state at {path}: {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `daemon-reload` was rejected by the service manager.
    #[error("failed to reload systemd: {0}")]
    Reload(#[source] SystemdError),

    /// The availability probe itself failed.
    #[error("systemd user session not available: {0}")]
    SystemdProbe(#[source] SystemdError),

    /// The probe ran but reported no reachable user session.
    #[error("systemd user session not available")]
    SystemdUnavailable,

    /// An I/O error outside the apply path, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pass was cancelled before completion.
    #[error("reconciliation cancelled")]
    Cancelled,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
