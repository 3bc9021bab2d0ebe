//! Persistence backends for the session store.
//!
//! A backend stores one opaque document: the serialized session collection
//! plus the active-session id. Writes replace the whole document atomically,
//! so a reader never observes a partially written state.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::StoreError;

/// Storage for the single persisted state document.
pub trait StateBackend: Send {
    /// Read the stored document. `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored document with `contents`.
    fn save(&self, contents: &str) -> Result<(), StoreError>;

    /// Human-readable location, for log lines.
    fn describe(&self) -> String;
}

impl<B: StateBackend + Sync> StateBackend for Arc<B> {
    fn load(&self) -> Result<Option<String>, StoreError> {
        (**self).load()
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        (**self).save(contents)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// =============================================================================
// FileBackend
// =============================================================================

/// JSON document on disk, replaced by write-to-temp + rename.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(contents.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), bytes = contents.len(), "State file replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

// =============================================================================
// MemoryBackend
// =============================================================================

/// In-memory document cell. Clones share the same cell, so a test can keep a
/// handle to inspect or seed what the store persists.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    cell: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `contents` already stored.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let backend = Self::default();
        backend.set_contents(Some(contents.into()));
        backend
    }

    pub fn contents(&self) -> Option<String> {
        self.cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_contents(&self, contents: Option<String>) {
        *self
            .cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = contents;
    }

    /// Make every subsequent `save` fail, leaving the stored document untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        *self
            .writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory backend write rejected".to_string()));
        }
        self.set_contents(Some(contents.to_string()));
        *self
            .writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
