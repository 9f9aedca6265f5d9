//! Shell-out [`SystemdUser`] implementation backed by `systemctl --user`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tokio_util::sync::CancellationToken;

use crate::error::SystemdError;
use crate::SystemdUser;

/// Traditional hard-coded location of the Podman quadlet generator, used when
/// the binary is not resolvable through `PATH`.
const GENERATOR_FALLBACK: &str = "/usr/lib/systemd/system-generators/podman-system-generator";

/// `systemctl status` exits 1-3 on degraded-but-running sessions; anything
/// above means the user manager is genuinely unreachable.
const MAX_DEGRADED_EXIT: i32 = 3;

/// Service-manager client that shells out to `systemctl --user`.
#[derive(Debug, Clone)]
pub struct SystemctlClient {
    generator_path: PathBuf,
}

impl Default for SystemctlClient {
    fn default() -> Self {
        Self {
            generator_path: resolve_generator(),
        }
    }
}

impl SystemctlClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the generator binary location (used by tests).
    pub fn with_generator_path(generator_path: PathBuf) -> Self {
        Self { generator_path }
    }

    fn systemctl(
        &self,
        cancel: &CancellationToken,
        command: &'static str,
        args: &[&str],
    ) -> Result<std::process::Output, SystemdError> {
        if cancel.is_cancelled() {
            return Err(SystemdError::Cancelled);
        }
        Command::new("systemctl")
            .arg("--user")
            .args(args)
            .output()
            .map_err(|e| SystemdError::Spawn { command, source: e })
    }
}

impl SystemdUser for SystemctlClient {
    fn is_available(&self, cancel: &CancellationToken) -> Result<bool, SystemdError> {
        let output = self.systemctl(cancel, "systemctl --user status", &["status"])?;
        match output.status.code() {
            Some(code) if code <= MAX_DEGRADED_EXIT => Ok(true),
            _ => Ok(false),
        }
    }

    fn daemon_reload(&self, cancel: &CancellationToken) -> Result<(), SystemdError> {
        let output = self.systemctl(cancel, "systemctl --user daemon-reload", &["daemon-reload"])?;
        if !output.status.success() {
            return Err(SystemdError::Command {
                command: "systemctl --user daemon-reload",
                detail: combined_output(&output),
            });
        }
        Ok(())
    }

    fn try_restart_units(
        &self,
        cancel: &CancellationToken,
        units: &[String],
    ) -> Result<(), SystemdError> {
        if units.is_empty() {
            return Ok(());
        }
        let mut args = vec!["try-restart"];
        args.extend(units.iter().map(String::as_str));
        let output = self.systemctl(cancel, "systemctl --user try-restart", &args)?;
        if !output.status.success() {
            return Err(SystemdError::Command {
                command: "systemctl --user try-restart",
                detail: combined_output(&output),
            });
        }
        Ok(())
    }

    fn validate_quadlets(
        &self,
        cancel: &CancellationToken,
        quadlet_dir: &Path,
    ) -> Result<(), SystemdError> {
        if cancel.is_cancelled() {
            return Err(SystemdError::Cancelled);
        }
        if !self.generator_path.is_file() {
            tracing::warn!(
                path = %self.generator_path.display(),
                quadlet_dir = %quadlet_dir.display(),
                "podman-system-generator not found, skipping quadlet validation",
            );
            return Ok(());
        }
        let output = Command::new(&self.generator_path)
            .args(["--user", "--dryrun"])
            .output()
            .map_err(|e| SystemdError::Spawn {
                command: "podman-system-generator",
                source: e,
            })?;
        if !output.status.success() {
            return Err(SystemdError::Command {
                command: "podman-system-generator --dryrun",
                detail: combined_output(&output).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve the generator through `PATH`, falling back to the traditional
/// systemd generator directory.
fn resolve_generator() -> PathBuf {
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join("podman-system-generator");
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    PathBuf::from(GENERATOR_FALLBACK)
}

fn combined_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
