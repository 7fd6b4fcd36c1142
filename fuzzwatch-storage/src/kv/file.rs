//! File-backed persisted store.

use super::backend::KvBackend;
use fuzzwatch_core::StorageError;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::warn;

type Document = BTreeMap<String, String>;

/// Backend that keeps every key in one JSON document on disk.
///
/// Each call re-reads the document so writes from another process are
/// picked up. Writes go to a temporary file in the same directory which is
/// then renamed over the document, so a crash never leaves a half-written
/// file behind. A document that fails to parse reads as empty.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open (or lazily create) the document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(io_error(e)),
        };
        if text.trim().is_empty() {
            return Ok(Document::new());
        }
        match serde_json::from_str(&text) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Persisted document is corrupt, reading as empty"
                );
                Ok(Document::new())
            }
        }
    }

    fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| StorageError::Io {
            reason: e.to_string(),
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
        tmp.write_all(&bytes).map_err(io_error)?;
        tmp.as_file().sync_all().map_err(io_error)?;
        tmp.persist(&self.path).map_err(|e| io_error(e.error))?;
        Ok(())
    }

    /// Load, apply `edit`, save. Serialized within this process.
    fn update<F>(&self, edit: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Document),
    {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut doc = self.load()?;
        edit(&mut doc);
        self.save(&doc)
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io {
        reason: e.to_string(),
    }
}

impl KvBackend for FileBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.update(|doc| {
            doc.insert(key.to_string(), value);
        })
    }

    fn remove_raw(&self, key: &str) -> Result<(), StorageError> {
        self.update(|doc| {
            doc.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(|doc| doc.clear())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.load()?.into_keys().collect())
    }
}
