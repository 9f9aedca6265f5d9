//! `quadsync serve` — initial sync, then the webhook server until signalled.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use tokio_util::sync::CancellationToken;

use quadsync_core::Config;
use quadsync_git::ShellClient;
use quadsync_server::WebhookServer;
use quadsync_systemd::SystemctlClient;

use super::sync::spawn_signal_handler;

/// Window allowed for an in-flight pass after the server stops accepting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub fn run(config_path: PathBuf) -> Result<()> {
    let cfg = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    ensure!(
        cfg.serve.enabled,
        "serve.enabled must be true in the configuration to run the webhook server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    let result = runtime.block_on(async move {
        let cancel = CancellationToken::new();
        spawn_signal_handler(cancel.clone());

        let git = ShellClient::new(
            cfg.auth.ssh_key_file.clone(),
            cfg.auth.https_token_file.clone(),
        );
        let systemd = SystemctlClient::new();

        let server = WebhookServer::new(cfg, git, systemd, cancel)
            .context("failed to build webhook server")?;
        server.serve().await.context("webhook server failed")
    });

    // Hard deadline for any pass still draining on the blocking pool; the
    // engine aborts at its next collaborator call once cancelled.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}
