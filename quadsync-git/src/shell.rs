//! Shell-out [`GitClient`] implementation.
//!
//! Authentication is injected per-invocation: SSH keys via `GIT_SSH_COMMAND`,
//! HTTPS tokens via an ephemeral credential helper fed from an environment
//! variable so the token never appears in argv.

use std::path::{Path, PathBuf};
use std::process::Command;

use tokio_util::sync::CancellationToken;

use crate::error::{io_err, GitError};
use crate::GitClient;

/// Environment variable the HTTPS credential helper reads the token from.
const TOKEN_ENV: &str = "QUADSYNC_GIT_TOKEN";

/// Git client that shells out to the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct ShellClient {
    ssh_key_file: Option<PathBuf>,
    https_token_file: Option<PathBuf>,
}

impl ShellClient {
    pub fn new(ssh_key_file: Option<PathBuf>, https_token_file: Option<PathBuf>) -> Self {
        Self {
            ssh_key_file,
            https_token_file,
        }
    }

    /// Build a `git` command with auth configured for `url`.
    ///
    /// Auth only applies when the URL scheme matches the configured method;
    /// checkout-phase subcommands never talk to the remote and pass `None`.
    fn git_command(&self, url: Option<&str>, args: &[&str]) -> Result<Command, GitError> {
        let mut cmd = Command::new("git");

        if let (Some(url), Some(key)) = (url, self.ssh_key_file.as_deref()) {
            if url.starts_with("git@") || url.starts_with("ssh://") {
                let ssh = format!(
                    "ssh -i {} -o StrictHostKeyChecking=accept-new -F /dev/null",
                    shell_quote(&key.to_string_lossy())
                );
                cmd.env("GIT_SSH_COMMAND", ssh);
            }
        }

        if let (Some(url), Some(token_file)) = (url, self.https_token_file.as_deref()) {
            if url.starts_with("https://") {
                let token = std::fs::read_to_string(token_file)
                    .map_err(|e| io_err(token_file, e))?;
                cmd.env("GIT_TERMINAL_PROMPT", "0");
                cmd.env(TOKEN_ENV, token.trim());
                cmd.arg("-c").arg(format!(
                    "credential.helper=!f() {{ echo \"username=x-access-token\"; \
                     echo \"password=${TOKEN_ENV}\"; }}; f"
                ));
            }
        }

        cmd.args(args);
        Ok(cmd)
    }

    fn run(
        &self,
        cancel: &CancellationToken,
        action: &'static str,
        url: Option<&str>,
        args: &[&str],
    ) -> Result<String, GitError> {
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        let mut cmd = self.git_command(url, args)?;
        let output = cmd.output().map_err(|e| io_err("git", e))?;
        let combined = combined_output(&output);
        if !output.status.success() {
            return Err(GitError::Command {
                action,
                detail: combined,
            });
        }
        Ok(combined)
    }
}

impl GitClient for ShellClient {
    fn ensure_checkout(
        &self,
        cancel: &CancellationToken,
        url: &str,
        git_ref: &str,
        dest_dir: &Path,
    ) -> Result<String, GitError> {
        let dest = dest_dir.to_string_lossy().into_owned();
        let exists = dest_dir.join(".git").is_dir();

        if exists {
            self.run(cancel, "fetch", Some(url), &["-C", &dest, "fetch", "origin"])?;
        } else {
            if let Some(parent) = dest_dir.parent() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            self.run(
                cancel,
                "clone",
                Some(url),
                &["clone", "--no-checkout", url, &dest],
            )?;
        }

        // Direct checkout first (local branches, tags, commit hashes), then
        // fall back to the remote-tracking branch for refs that only exist
        // on origin.
        if let Err(direct) = self.run(cancel, "checkout", None, &["-C", &dest, "checkout", "-f", git_ref])
        {
            if matches!(direct, GitError::Cancelled) {
                return Err(direct);
            }
            let remote_ref = format!("origin/{git_ref}");
            self.run(
                cancel,
                "checkout",
                None,
                &["-C", &dest, "checkout", "-f", &remote_ref],
            )
            .map_err(|e| match e {
                GitError::Cancelled => GitError::Cancelled,
                GitError::Command { detail, .. } => GitError::UnknownRef {
                    git_ref: git_ref.to_string(),
                    detail,
                },
                other => other,
            })?;
        }

        // A pre-existing local branch may be stale after fetch; force it onto
        // the remote-tracking commit. No-op for fresh clones, harmless for
        // tags and commit hashes.
        if exists {
            let remote_ref = format!("origin/{git_ref}");
            if let Err(err) = self.run(
                cancel,
                "reset",
                None,
                &["-C", &dest, "reset", "--hard", &remote_ref],
            ) {
                if matches!(err, GitError::Cancelled) {
                    return Err(err);
                }
                tracing::debug!(git_ref, error = %err, "reset to remote-tracking ref skipped");
            }
        }

        let revision = self.run(cancel, "rev-parse", None, &["-C", &dest, "rev-parse", "HEAD"])?;
        Ok(revision.trim().to_string())
    }
}

/// Wrap `s` in single quotes, escaping any embedded single quotes.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn combined_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
