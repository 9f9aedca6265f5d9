//! Configuration schema and loading.
//!
//! The config file is YAML. Every string field supports `${VAR}` environment
//! expansion; both filesystem paths must be absolute after expansion.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Restart policy applied after a successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Never restart units.
    None,
    /// Restart only units whose quadlet file was added, updated, or deleted.
    #[default]
    Changed,
    /// Restart every unit tracked in the manifest.
    AllManaged,
}

impl std::fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartPolicy::None => write!(f, "none"),
            RestartPolicy::Changed => write!(f, "changed"),
            RestartPolicy::AllManaged => write!(f, "all-managed"),
        }
    }
}

/// Git repository source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub url: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Relative subpath under the repo for discovery; empty means repo root.
    #[serde(default)]
    pub subdir: String,
}

/// Local filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Mirror target for quadlet and companion files.
    pub quadlet_dir: PathBuf,
    /// Directory holding the manifest and the git working tree.
    pub state_dir: PathBuf,
}

/// Sync behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub restart: RestartPolicy,
}

/// Git authentication. At most one method may be configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub ssh_key_file: Option<PathBuf>,
    #[serde(default)]
    pub https_token_file: Option<PathBuf>,
}

/// Webhook server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub listen_addr: String,
    #[serde(default)]
    pub github_webhook_secret_file: Option<PathBuf>,
    /// Event-type allow-list; empty allows every event.
    #[serde(default)]
    pub allowed_event_types: Vec<String>,
    /// Ref allow-list; empty allows every ref.
    #[serde(default)]
    pub allowed_refs: Vec<String>,
}

/// Complete quadsync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub repo: RepoConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Read, parse, expand, and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Config::parse(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse configuration from a YAML string (expansion + validation included).
    pub fn parse(contents: &str) -> Result<Config, ConfigError> {
        let mut cfg: Config =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                path: PathBuf::new(),
                source: e,
            })?;
        cfg.expand_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn expand_env(&mut self) -> Result<(), ConfigError> {
        expand_string(&mut self.repo.url)?;
        expand_string(&mut self.repo.git_ref)?;
        expand_string(&mut self.repo.subdir)?;
        expand_path(&mut self.paths.quadlet_dir)?;
        expand_path(&mut self.paths.state_dir)?;
        if let Some(path) = self.auth.ssh_key_file.as_mut() {
            expand_path(path)?;
        }
        if let Some(path) = self.auth.https_token_file.as_mut() {
            expand_path(path)?;
        }
        expand_string(&mut self.serve.listen_addr)?;
        if let Some(path) = self.serve.github_webhook_secret_file.as_mut() {
            expand_path(path)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.repo.url.is_empty() {
            return Err(invalid("repo.url is required"));
        }
        if self.repo.git_ref.is_empty() {
            return Err(invalid("repo.ref is required"));
        }

        if self.paths.quadlet_dir.as_os_str().is_empty() {
            return Err(invalid("paths.quadlet_dir is required"));
        }
        if self.paths.state_dir.as_os_str().is_empty() {
            return Err(invalid("paths.state_dir is required"));
        }
        if !self.paths.quadlet_dir.is_absolute() {
            return Err(invalid(format!(
                "paths.quadlet_dir must be an absolute path: {}",
                self.paths.quadlet_dir.display()
            )));
        }
        if !self.paths.state_dir.is_absolute() {
            return Err(invalid(format!(
                "paths.state_dir must be an absolute path: {}",
                self.paths.state_dir.display()
            )));
        }

        for (option, path) in [
            ("auth.ssh_key_file", self.auth.ssh_key_file.as_deref()),
            ("auth.https_token_file", self.auth.https_token_file.as_deref()),
            (
                "serve.github_webhook_secret_file",
                self.serve.github_webhook_secret_file.as_deref(),
            ),
        ] {
            if let Some(path) = path {
                if !path.is_absolute() {
                    return Err(invalid(format!(
                        "{option} must be an absolute path: {}",
                        path.display()
                    )));
                }
            }
        }

        if self.auth.ssh_key_file.is_some() && self.auth.https_token_file.is_some() {
            return Err(invalid(
                "auth: only one of ssh_key_file or https_token_file may be set",
            ));
        }
        if self.auth.ssh_key_file.is_some() && !self.is_ssh() {
            return Err(invalid(
                "auth.ssh_key_file is set but repo.url does not use an SSH scheme (git@ or ssh://)",
            ));
        }
        if self.auth.https_token_file.is_some() && !self.is_https() {
            return Err(invalid(
                "auth.https_token_file is set but repo.url does not use HTTPS scheme",
            ));
        }

        if self.serve.enabled {
            if self.serve.listen_addr.is_empty() {
                return Err(invalid("serve.listen_addr is required when serve is enabled"));
            }
            if self.serve.github_webhook_secret_file.is_none() {
                return Err(invalid(
                    "serve.github_webhook_secret_file is required when serve is enabled",
                ));
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived paths
    // -----------------------------------------------------------------------

    /// Directory where the git repository is checked out.
    pub fn repo_dir(&self) -> PathBuf {
        self.paths.state_dir.join("repo")
    }

    /// Path to the persisted manifest.
    pub fn state_file_path(&self) -> PathBuf {
        self.paths.state_dir.join("state.json")
    }

    /// Effective source root for file discovery within the checkout.
    pub fn source_dir(&self) -> PathBuf {
        if self.repo.subdir.is_empty() {
            self.repo_dir()
        } else {
            self.repo_dir().join(&self.repo.subdir)
        }
    }

    /// Human-readable description of the configured auth method.
    pub fn auth_method(&self) -> &'static str {
        if self.auth.ssh_key_file.is_some() {
            "ssh"
        } else if self.auth.https_token_file.is_some() {
            "https"
        } else {
            "none"
        }
    }

    pub fn is_https(&self) -> bool {
        self.repo.url.starts_with("https://")
    }

    pub fn is_ssh(&self) -> bool {
        self.repo.url.starts_with("git@") || self.repo.url.starts_with("ssh://")
    }
}

fn expand_string(value: &mut String) -> Result<(), ConfigError> {
    let expanded = shellexpand::env(value.as_str())
        .map_err(|e| ConfigError::Expand {
            value: value.clone(),
            source: e,
        })?
        .into_owned();
    *value = expanded;
    Ok(())
}

fn expand_path(value: &mut PathBuf) -> Result<(), ConfigError> {
    let mut raw = value.to_string_lossy().into_owned();
    expand_string(&mut raw)?;
    *value = PathBuf::from(raw);
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
