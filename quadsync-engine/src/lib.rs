//! # quadsync-engine
//!
//! The reconciliation engine: one [`Engine::run`] call fetches the configured
//! repository, diffs the discovered source tree against the persisted
//! manifest, applies the resulting plan to the quadlet directory with
//! per-file atomic replacement, and tells the user-scope service manager to
//! reload and (per policy) restart the derived units.

pub mod apply;
pub mod discover;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod plan;
pub mod restart;
pub mod state;

pub use engine::{Engine, PassReport};
pub use error::EngineError;
pub use plan::{FileOp, Plan};
pub use state::{ManagedFile, Manifest};
