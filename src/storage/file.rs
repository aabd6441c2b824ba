use crate::document::TreeDocument;
use crate::storage::{Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Default extension for mirrored documents
pub const DEFAULT_EXTENSION: &str = "xml";

/// Longest file name, in bytes, common filesystems accept
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Writes one file per node into a directory
///
/// Files are named `<TextId>.<extension>` and hold the document bytes
/// exactly as fetched. Writing the same id twice overwrites the file.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
    extension: String,
    written: usize,
}

impl FileStorage {
    /// Opens (and creates if needed) the output directory
    pub fn new(directory: &Path, extension: &str) -> StorageResult<Self> {
        if directory.exists() && !directory.is_dir() {
            return Err(StorageError::NotADirectory(directory.to_path_buf()));
        }

        fs::create_dir_all(directory).map_err(|source| StorageError::Io {
            path: directory.to_path_buf(),
            source,
        })?;

        Ok(Self {
            directory: directory.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
            written: 0,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path a document with the given id would be written to
    ///
    /// Returns None if the id cannot be used as a file name.
    pub fn path_for(&self, id: &str) -> Option<PathBuf> {
        if !is_safe_file_stem(id) {
            return None;
        }

        let name = format!("{}.{}", id, self.extension);
        if name.len() > MAX_FILE_NAME_BYTES {
            return None;
        }
        Some(self.directory.join(name))
    }
}

impl Storage for FileStorage {
    fn persist(&mut self, document: &TreeDocument) -> StorageResult<Option<PathBuf>> {
        let Some(id) = document.self_id.as_ref() else {
            tracing::debug!("Document has no TextId, skipping write");
            return Ok(None);
        };

        let Some(path) = self.path_for(id.as_str()) else {
            tracing::warn!("TextId {:?} is not a usable file name, skipping write", id.as_str());
            return Ok(None);
        };

        if let Err(source) = fs::write(&path, document.as_bytes()) {
            // A vanished output directory stops every later write too
            if !self.directory.is_dir() {
                return Err(StorageError::NotADirectory(self.directory.clone()));
            }
            return Err(StorageError::Document { path, source });
        }
        self.written += 1;

        tracing::trace!("Wrote {}", path.display());
        Ok(Some(path))
    }

    fn persisted_count(&self) -> usize {
        self.written
    }
}

/// Rejects ids that would escape the output directory
fn is_safe_file_stem(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.chars().any(|c| c == '/' || c == '\\' || c == '\0')
}
