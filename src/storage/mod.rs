//! Storage module for persisting mirrored documents
//!
//! This module handles writing fetched node documents to local storage,
//! one file per node, named after the node's own `TextId`.

mod file;
mod traits;

pub use file::{FileStorage, DEFAULT_EXTENSION};
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens a file-backed storage in the given directory
///
/// # Arguments
///
/// * `directory` - Output directory, created if missing
/// * `extension` - File extension without the leading dot
///
/// # Returns
///
/// * `Ok(FileStorage)` - Storage ready for writes
/// * `Err(StorageError)` - The directory could not be created
pub fn open_storage(directory: &Path, extension: &str) -> StorageResult<FileStorage> {
    FileStorage::new(directory, extension)
}
