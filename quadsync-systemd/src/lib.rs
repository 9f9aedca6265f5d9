//! # quadsync-systemd
//!
//! Service-manager client used by the reconciliation engine, expressed as the
//! [`SystemdUser`] trait so tests can substitute a recording mock.
//! [`SystemctlClient`] is the production implementation and shells out to
//! `systemctl --user` plus the Podman quadlet generator.

pub mod error;
pub mod systemctl;

use std::path::Path;

use tokio_util::sync::CancellationToken;

pub use error::SystemdError;
pub use systemctl::SystemctlClient;

/// Operations on the host's user-scope service manager.
pub trait SystemdUser: Send + Sync {
    /// Cheap probe for a reachable user session. Degraded-but-running
    /// sessions count as available.
    fn is_available(&self, cancel: &CancellationToken) -> Result<bool, SystemdError>;

    /// Reload the user manager configuration so newly written units are seen.
    fn daemon_reload(&self, cancel: &CancellationToken) -> Result<(), SystemdError>;

    /// Restart only units that are currently active; missing or inactive
    /// targets are not errors.
    fn try_restart_units(
        &self,
        cancel: &CancellationToken,
        units: &[String],
    ) -> Result<(), SystemdError>;

    /// Run the quadlet generator in dry-run mode over `quadlet_dir`. When the
    /// generator binary is absent on the host, validation is skipped with a
    /// warning and reported as success.
    fn validate_quadlets(
        &self,
        cancel: &CancellationToken,
        quadlet_dir: &Path,
    ) -> Result<(), SystemdError>;
}
