//! Streaming SHA-256 content hashing.

use std::fs::File;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::EngineError;

/// Compute the SHA-256 digest of a file's bytes as 64 lowercase hex chars.
///
/// Streams through [`std::io::copy`] so memory stays constant regardless of
/// file size; the handle closes on every exit path when it drops.
pub fn file_sha256(path: &Path) -> Result<String, EngineError> {
    let hash_err = |source| EngineError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(hash_err)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(hash_err)?;
    Ok(hex::encode(hasher.finalize()))
}
