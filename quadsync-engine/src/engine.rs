//! The reconciliation engine — one end-to-end pass.
//!
//! Step order is load-bearing: files must be on disk before the manifest is
//! written, the manifest before `daemon-reload`, and the reload before any
//! restart, so the service manager never sees files the manifest does not
//! claim and restarts always target freshly generated units.

use tokio_util::sync::CancellationToken;

use quadsync_core::Config;
use quadsync_git::GitClient;
use quadsync_systemd::SystemdUser;

use crate::apply::apply_plan;
use crate::discover::discover_files;
use crate::error::{io_err, EngineError};
use crate::hasher::file_sha256;
use crate::plan::{build_plan, Plan, SourceFile};
use crate::restart::restart_set;
use crate::state::{self, ManagedFile, Manifest};

/// Summary of a completed pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    /// Commit identifier the checkout resolved to.
    pub revision: String,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Units handed to try-restart (empty for policy `none` and dry runs).
    pub restarted: Vec<String>,
    pub dry_run: bool,
}

/// Composes discovery, planning, application, and the two external
/// collaborators into a single reconciliation pass.
///
/// The engine owns nothing long-lived; collaborators are borrowed.
pub struct Engine<'a, G, S> {
    cfg: &'a Config,
    git: &'a G,
    systemd: &'a S,
    dry_run: bool,
}

impl<'a, G: GitClient, S: SystemdUser> Engine<'a, G, S> {
    pub fn new(cfg: &'a Config, git: &'a G, systemd: &'a S, dry_run: bool) -> Self {
        Self {
            cfg,
            git,
            systemd,
            dry_run,
        }
    }

    /// Run one complete pass. See the module docs for the step ordering.
    pub fn run(&self, cancel: &CancellationToken) -> Result<PassReport, EngineError> {
        tracing::info!(
            repo = %self.cfg.repo.url,
            git_ref = %self.cfg.repo.git_ref,
            dry_run = self.dry_run,
            "starting sync",
        );

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let state_dir = &self.cfg.paths.state_dir;
        std::fs::create_dir_all(state_dir).map_err(|e| io_err(state_dir, e))?;

        let repo_dir = self.cfg.repo_dir();
        tracing::info!(dest = %repo_dir.display(), "fetching repository");
        let revision = self.git.ensure_checkout(
            cancel,
            &self.cfg.repo.url,
            &self.cfg.repo.git_ref,
            &repo_dir,
        )?;
        tracing::info!(commit = %revision, "repository checked out");

        let state_path = self.cfg.state_file_path();
        let prev = match state::load(&state_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "failed to load previous state (will treat as fresh sync)",
                );
                Manifest::default()
            }
        };

        let sources = self.collect_sources(cancel)?;
        tracing::info!(count = sources.len(), "discovered source files");

        let plan = build_plan(
            &prev,
            &self.cfg.paths.quadlet_dir,
            self.cfg.sync.prune,
            &sources,
        )?;
        tracing::info!(
            add = plan.add.len(),
            update = plan.update.len(),
            delete = plan.delete.len(),
            "sync plan",
        );

        if self.dry_run {
            log_plan_details(&plan);
            tracing::info!("dry-run complete, no changes applied");
            return Ok(self.report(&plan, revision, Vec::new()));
        }

        match self.systemd.is_available(cancel) {
            Ok(true) => {}
            Ok(false) => return Err(EngineError::SystemdUnavailable),
            Err(err) => return Err(EngineError::SystemdProbe(err)),
        }

        apply_plan(cancel, &plan, &self.cfg.paths.quadlet_dir)?;

        tracing::info!(
            quadlet_dir = %self.cfg.paths.quadlet_dir.display(),
            "validating quadlet definitions",
        );
        self.systemd
            .validate_quadlets(cancel, &self.cfg.paths.quadlet_dir)
            .map_err(EngineError::Validation)?;

        let next = build_manifest(&prev, &plan, revision.clone());
        state::save(&state_path, &next)?;

        tracing::info!("reloading systemd daemon");
        self.systemd
            .daemon_reload(cancel)
            .map_err(EngineError::Reload)?;

        let units: Vec<String> = restart_set(self.cfg.sync.restart, &plan, &next)
            .into_iter()
            .collect();
        if units.is_empty() {
            tracing::info!(policy = %self.cfg.sync.restart, "no units to restart");
        } else {
            tracing::info!(policy = %self.cfg.sync.restart, count = units.len(), "restarting units");
            // Restart trouble never fails the pass; the next pass retries
            // nothing here because files and manifest are already in sync.
            if let Err(err) = self.systemd.try_restart_units(cancel, &units) {
                tracing::warn!(error = %err, "restart operations had issues");
            }
        }

        tracing::info!("sync completed successfully");
        Ok(self.report(&plan, revision, units))
    }

    fn collect_sources(&self, cancel: &CancellationToken) -> Result<Vec<SourceFile>, EngineError> {
        let source_root = self.cfg.source_dir();
        let mut sources = Vec::new();
        for path in discover_files(&source_root)? {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let rel = path
                .strip_prefix(&source_root)
                .map_err(|_| EngineError::PathEscape { dest: path.clone() })?
                .to_path_buf();
            let hash = file_sha256(&path)?;
            sources.push(SourceFile { path, rel, hash });
        }
        Ok(sources)
    }

    fn report(&self, plan: &Plan, revision: String, restarted: Vec<String>) -> PassReport {
        PassReport {
            revision,
            added: plan.add.len(),
            updated: plan.update.len(),
            deleted: plan.delete.len(),
            restarted,
            dry_run: self.dry_run,
        }
    }
}

/// Fold the applied plan into the previous manifest.
fn build_manifest(prev: &Manifest, plan: &Plan, revision: String) -> Manifest {
    let mut managed_files = prev.managed_files.clone();

    for op in &plan.delete {
        managed_files.remove(&op.dest_path);
    }
    for op in plan.add.iter().chain(&plan.update) {
        managed_files.insert(
            op.dest_path.clone(),
            ManagedFile {
                source_path: op.source_rel.clone(),
                hash: op.hash.clone(),
            },
        );
    }

    Manifest {
        revision,
        managed_files,
    }
}

fn log_plan_details(plan: &Plan) {
    for op in &plan.add {
        tracing::info!(
            op = "add",
            dest = %op.dest_path.display(),
            source = %op.source_path.display(),
            "[dry-run] would add",
        );
    }
    for op in &plan.update {
        tracing::info!(
            op = "update",
            dest = %op.dest_path.display(),
            source = %op.source_path.display(),
            "[dry-run] would update",
        );
    }
    for op in &plan.delete {
        tracing::info!(op = "delete", dest = %op.dest_path.display(), "[dry-run] would delete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::FileOp;
    use std::path::PathBuf;

    fn file_op(rel: &str, dest: &str, hash: &str) -> FileOp {
        FileOp {
            source_path: PathBuf::from("/state/repo").join(rel),
            source_rel: PathBuf::from(rel),
            dest_path: PathBuf::from(dest),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn build_manifest_upserts_and_removes() {
        let mut prev = Manifest {
            revision: "old".into(),
            managed_files: Default::default(),
        };
        prev.managed_files.insert(
            PathBuf::from("/q/stale.container"),
            ManagedFile {
                source_path: PathBuf::from("stale.container"),
                hash: "000".into(),
            },
        );
        prev.managed_files.insert(
            PathBuf::from("/q/keep.env"),
            ManagedFile {
                source_path: PathBuf::from("keep.env"),
                hash: "111".into(),
            },
        );

        let plan = Plan {
            add: vec![file_op("web.container", "/q/web.container", "aaa")],
            update: vec![],
            delete: vec![FileOp::delete(PathBuf::from("/q/stale.container"))],
        };

        let next = build_manifest(&prev, &plan, "new-rev".into());
        assert_eq!(next.revision, "new-rev");
        assert_eq!(next.managed_files.len(), 2);
        assert!(next.managed_files.contains_key(&PathBuf::from("/q/web.container")));
        assert!(next.managed_files.contains_key(&PathBuf::from("/q/keep.env")));
        assert!(!next.managed_files.contains_key(&PathBuf::from("/q/stale.container")));
    }

    #[test]
    fn build_manifest_update_overwrites_hash_and_source() {
        let mut prev = Manifest::default();
        prev.managed_files.insert(
            PathBuf::from("/q/web.container"),
            ManagedFile {
                source_path: PathBuf::from("old/web.container"),
                hash: "old-hash".into(),
            },
        );

        let plan = Plan {
            update: vec![file_op("web.container", "/q/web.container", "new-hash")],
            ..Plan::default()
        };

        let next = build_manifest(&prev, &plan, "rev".into());
        let entry = &next.managed_files[&PathBuf::from("/q/web.container")];
        assert_eq!(entry.hash, "new-hash");
        assert_eq!(entry.source_path, PathBuf::from("web.container"));
    }
}
