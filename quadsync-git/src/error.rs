//! Error types for quadsync-git.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A git subcommand exited non-zero; `detail` carries its combined output.
    #[error("git {action} failed: {detail}")]
    Command { action: &'static str, detail: String },

    /// The requested ref could not be checked out locally or as a remote branch.
    #[error("git checkout failed for ref '{git_ref}' (tried both direct and origin/): {detail}")]
    UnknownRef { git_ref: String, detail: String },

    /// The operation was cancelled before completion.
    #[error("git operation cancelled")]
    Cancelled,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}
