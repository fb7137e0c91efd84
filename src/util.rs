//! Utility functions for Sieve.

use std::fs;
use std::path::Path;

use crate::error::{Result, SieveError};

/// Maximum corpus file size that can be read into memory (64 MB).
///
/// The whole corpus is held in memory anyway; this limit only guards
/// against pointing the source at the wrong file.
pub const MAX_CORPUS_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Read a file into a string, rejecting files over [`MAX_CORPUS_FILE_SIZE`].
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_CORPUS_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read (doesn't exist, permission denied, etc.)
/// * The file exceeds `max_size`
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| SieveError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(SieveError::too_large(path, size, max_size));
    }

    fs::read_to_string(path).map_err(|e| SieveError::storage(path, e))
}
