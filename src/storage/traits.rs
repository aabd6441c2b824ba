//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::document::TreeDocument;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output location is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// One document could not be written; the output location is fine
    #[error("Cannot write {path}: {source}")]
    Document {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StorageError {
    /// Returns true if no further document can be written either
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Document { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawler calls `persist` at most once per node.
pub trait Storage: Send {
    /// Writes a document under its own id
    ///
    /// # Returns
    ///
    /// * `Ok(Some(path))` - The document was written to `path`
    /// * `Ok(None)` - The document has no usable name and was skipped
    /// * `Err(StorageError)` - The write failed; see [`StorageError::is_fatal`]
    fn persist(&mut self, document: &TreeDocument) -> StorageResult<Option<PathBuf>>;

    /// Number of documents written so far
    fn persisted_count(&self) -> usize;
}
