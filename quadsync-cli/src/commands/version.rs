//! `quadsync version` — build metadata.

pub fn run() {
    println!("quadsync {}", env!("CARGO_PKG_VERSION"));
    println!("  commit: {}", option_env!("QUADSYNC_COMMIT").unwrap_or("none"));
}
