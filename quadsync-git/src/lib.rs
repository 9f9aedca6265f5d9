//! # quadsync-git
//!
//! Version-control client used by the reconciliation engine. The engine only
//! needs one operation — bring a local checkout to a configured ref and
//! report the resolved commit — expressed as the [`GitClient`] trait so tests
//! can substitute a mock. [`ShellClient`] is the production implementation
//! and shells out to the `git` binary.

pub mod error;
pub mod shell;

use std::path::Path;

use tokio_util::sync::CancellationToken;

pub use error::GitError;
pub use shell::ShellClient;

/// Version-control operations consumed by the engine.
pub trait GitClient: Send + Sync {
    /// Clone or update the repository at `url` into `dest_dir` and place the
    /// working tree at `git_ref` (branch, tag, or commit id). When the ref
    /// resolves both locally and remotely, the remote-tracking version wins.
    ///
    /// Returns the resolved commit identifier.
    fn ensure_checkout(
        &self,
        cancel: &CancellationToken,
        url: &str,
        git_ref: &str,
        dest_dir: &Path,
    ) -> Result<String, GitError>;
}
