//! Plan application — crash-safe per-file replacement in the quadlet
//! directory.
//!
//! Each add/update streams the source into a temp file created in the
//! destination's own directory, copies the source mode over, then renames
//! into place, so readers only ever observe the fully-old or fully-new file.
//! Ops run in order (adds, updates, deletes) and the first failure aborts,
//! leaving earlier per-file effects in place for the next pass to reconcile.

use std::fs::File;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::plan::{FileOp, Plan};

/// Execute `plan` against `dest_dir`.
pub fn apply_plan(
    cancel: &CancellationToken,
    plan: &Plan,
    dest_dir: &Path,
) -> Result<(), EngineError> {
    std::fs::create_dir_all(dest_dir).map_err(|source| EngineError::Apply {
        op: "create-dest-dir",
        dest: dest_dir.to_path_buf(),
        source,
    })?;

    for op in &plan.add {
        check_cancel(cancel)?;
        tracing::info!(dest = %op.dest_path.display(), "adding file");
        copy_file(op, "add")?;
    }

    for op in &plan.update {
        check_cancel(cancel)?;
        tracing::info!(dest = %op.dest_path.display(), "updating file");
        copy_file(op, "update")?;
    }

    for op in &plan.delete {
        check_cancel(cancel)?;
        tracing::info!(dest = %op.dest_path.display(), "deleting file");
        delete_file(op)?;
    }

    Ok(())
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), EngineError> {
    if cancel.is_cancelled() {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}

/// Atomically replace `op.dest_path` with the content of `op.source_path`.
fn copy_file(op: &FileOp, kind: &'static str) -> Result<(), EngineError> {
    let apply_err = |source| EngineError::Apply {
        op: kind,
        dest: op.dest_path.clone(),
        source,
    };

    let parent = op
        .dest_path
        .parent()
        .ok_or_else(|| apply_err(std::io::Error::other("destination has no parent directory")))?;
    std::fs::create_dir_all(parent).map_err(apply_err)?;

    let mut source = File::open(&op.source_path).map_err(apply_err)?;
    let mode = source.metadata().map_err(apply_err)?.permissions();

    // Temp file lives in the destination directory so the final rename stays
    // on one filesystem; it unlinks itself on drop if anything below fails.
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(apply_err)?;
    std::io::copy(&mut source, tmp.as_file_mut()).map_err(apply_err)?;
    std::fs::set_permissions(tmp.path(), mode).map_err(apply_err)?;
    tmp.persist(&op.dest_path).map_err(|e| apply_err(e.error))?;
    Ok(())
}

/// Unlink `op.dest_path`; a file already gone is not an error.
fn delete_file(op: &FileOp) -> Result<(), EngineError> {
    match std::fs::remove_file(&op.dest_path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EngineError::Apply {
            op: "delete",
            dest: op.dest_path.clone(),
            source,
        }),
    }
}
