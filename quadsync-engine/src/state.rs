//! Manifest persistence — the durable record of what quadsync manages.
//!
//! The manifest lives at `<state_dir>/state.json` and maps absolute
//! destination paths to their relative source and content hash, plus the
//! last-applied source revision. Files in the quadlet directory that are
//! absent from the manifest are not managed and must never be touched.
//!
//! Writes use a sibling temp file plus atomic rename, so a crash mid-save
//! leaves either the old manifest or the new one, never a torn file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A file under management: where it came from and what it contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFile {
    /// Path relative to the effective source root.
    pub source_path: PathBuf,
    /// SHA-256 of the content, 64 lowercase hex chars.
    pub hash: String,
}

/// Persisted state: last applied revision plus the managed-file map.
///
/// `BTreeMap` keeps key order stable so the pretty-printed JSON diffs well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub managed_files: BTreeMap<PathBuf, ManagedFile>,
}

/// Load the manifest at `path`.
///
/// A missing file is a fresh start (empty manifest, no error). Unparseable
/// content is [`EngineError::StateCorrupt`]; the caller decides whether to
/// recover.
pub fn load(path: &Path) -> Result<Manifest, EngineError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Manifest::default());
        }
        Err(source) => {
            return Err(EngineError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&contents).map_err(|source| EngineError::StateCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist the manifest to `path` atomically.
///
/// Serializes as pretty-printed JSON, writes a temp file in the same
/// directory, then renames over the target. The temp file is removed on
/// every failure path.
pub fn save(path: &Path, manifest: &Manifest) -> Result<(), EngineError> {
    let write_err = |source| EngineError::StateWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .ok_or_else(|| write_err(std::io::Error::other("state path has no parent directory")))?;

    let json = serde_json::to_string_pretty(manifest).map_err(|e| write_err(e.into()))?;

    // NamedTempFile unlinks itself on drop, which covers every early return.
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    std::fs::write(tmp.path(), json.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
