//! `quadsync sync` — one reconciliation pass.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use quadsync_core::Config;
use quadsync_engine::{Engine, PassReport};
use quadsync_git::ShellClient;
use quadsync_systemd::SystemctlClient;

/// Arguments for `quadsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show what would be done without making changes.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self, config_path: PathBuf) -> Result<()> {
        let cfg = Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?;
        tracing::debug!(
            repo = %cfg.repo.url,
            git_ref = %cfg.repo.git_ref,
            quadlet_dir = %cfg.paths.quadlet_dir.display(),
            state_dir = %cfg.paths.state_dir.display(),
            "configuration loaded",
        );

        let dry_run = self.dry_run;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build runtime")?;

        let report = runtime.block_on(async move {
            let cancel = CancellationToken::new();
            spawn_signal_handler(cancel.clone());

            tokio::task::spawn_blocking(move || {
                let git = ShellClient::new(
                    cfg.auth.ssh_key_file.clone(),
                    cfg.auth.https_token_file.clone(),
                );
                let systemd = SystemctlClient::new();
                Engine::new(&cfg, &git, &systemd, dry_run).run(&cancel)
            })
            .await
            .context("sync task panicked")?
            .context("sync failed")
        })?;

        print_report(&report);
        Ok(())
    }
}

/// Cancel the pass on ctrl-c or SIGTERM; the engine aborts at its next
/// collaborator call.
pub(crate) fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let interrupted = wait_for_shutdown_signal().await;
        if interrupted {
            tracing::info!("received shutdown signal, cancelling");
            cancel.cancel();
        }
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(err) => {
            tracing::warn!(error = %err, "failed to install SIGTERM handler");
            return tokio::signal::ctrl_c().await.is_ok();
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.is_ok(),
        _ = term.recv() => true,
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> bool {
    tokio::signal::ctrl_c().await.is_ok()
}

fn print_report(report: &PassReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    if report.added == 0 && report.updated == 0 && report.deleted == 0 {
        println!("{prefix}✓ in sync with {} — nothing to do", short_rev(&report.revision));
        return;
    }
    println!(
        "{prefix}✓ synced to {} ({} added, {} updated, {} deleted)",
        short_rev(&report.revision),
        report.added,
        report.updated,
        report.deleted,
    );
    if !report.restarted.is_empty() {
        println!("  restarted: {}", report.restarted.join(", "));
    }
}

fn short_rev(revision: &str) -> &str {
    if revision.len() > 12 {
        &revision[..12]
    } else {
        revision
    }
}
