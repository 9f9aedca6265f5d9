//! quadsync — synchronize Podman Quadlets from a Git repository.
//!
//! # Usage
//!
//! ```text
//! quadsync sync [--dry-run] [--config PATH] [--log-level LEVEL] [--log-format text|json]
//! quadsync serve [--config PATH]
//! quadsync version
//! ```
//!
//! `sync` performs one reconciliation pass and exits; pair it with a systemd
//! timer for polling setups. `serve` runs the pass once, then listens for
//! GitHub webhook events and re-syncs on matching pushes.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use commands::sync::SyncArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "quadsync",
    version,
    about = "Synchronize Podman Quadlets from Git repositories",
    long_about = None,
)]
struct Cli {
    /// Config file (default: $HOME/.config/quadsync/config.yaml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Perform a one-time sync from repository to quadlet directory.
    Sync(SyncArgs),

    /// Run an initial sync, then serve GitHub webhook events.
    Serve,

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Sync(args) => {
            let config_path = resolve_config_path(cli.config.as_deref())?;
            args.run(config_path)
        }
        Commands::Serve => {
            let config_path = resolve_config_path(cli.config.as_deref())?;
            commands::serve::run(config_path)
        }
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

/// Resolve the config path: explicit flag (with `${VAR}` expansion) or the
/// per-user default location.
fn resolve_config_path(flag: Option<&str>) -> Result<PathBuf> {
    if let Some(raw) = flag {
        let expanded = shellexpand::env(raw)
            .with_context(|| format!("cannot expand config path '{raw}'"))?;
        return Ok(PathBuf::from(expanded.into_owned()));
    }

    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".config").join("quadsync").join("config.yaml"))
}
