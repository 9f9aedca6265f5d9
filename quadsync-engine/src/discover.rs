//! Source-tree discovery.
//!
//! Enumerates every regular file under the effective source root, skipping
//! hidden entries: any path component whose name starts with `.` is excluded,
//! and a hidden directory prunes its whole subtree (so `.git` is never
//! walked).

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::EngineError;

/// Enumerate all non-hidden regular files under `root`, sorted by path so
/// the order is stable for a given directory state.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>, EngineError> {
    if let Err(source) = std::fs::read_dir(root) {
        return Err(EngineError::SourceUnavailable {
            path: root.to_path_buf(),
            source,
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|source| EngineError::Discovery {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
