//! File access used by the `.clip` cache.
//!
//! The cache never touches the file system directly; it goes through a
//! [`FileStore`] so hosts can plug in their own virtual file system.
//! [`DiskStore`] and [`MemoryStore`] cover the common cases.

use hashbrown::HashMap;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

pub mod clip;

/// Generic I/O errors of a [`FileStore`].
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("std::io::Error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("the path is malformed: {0}")]
    MalformedPath(String),
}

/// Read, write and date files by their logical path.
pub trait FileStore {
    /// Whole contents of `path`.
    fn load_file(&self, path: &str) -> Result<Vec<u8>, IoError>;

    /// Replace the contents of `path`, creating it (and its directories) as needed.
    fn save_file(&self, path: &str, data: &[u8]) -> Result<(), IoError>;

    /// Order of the modification times of `a` and `b`.
    ///
    /// `None` when either file is missing or has no usable time.
    fn compare_file_time(&self, a: &str, b: &str) -> Option<Ordering>;
}

impl<T: FileStore + ?Sized> FileStore for &T {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, IoError> {
        (**self).load_file(path)
    }

    fn save_file(&self, path: &str, data: &[u8]) -> Result<(), IoError> {
        (**self).save_file(path, data)
    }

    fn compare_file_time(&self, a: &str, b: &str) -> Option<Ordering> {
        (**self).compare_file_time(a, b)
    }
}

/// Files below a root directory of the local file system.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical path below the root. Absolute paths (such as an absolute
    /// cache directory) are used as they are; `..` components are refused.
    fn resolve(&self, path: &str) -> Result<PathBuf, IoError> {
        let path_ref = Path::new(path);
        if path.is_empty() || path_ref.components().any(|c| c == Component::ParentDir) {
            return Err(IoError::MalformedPath(path.to_string()));
        }
        if path_ref.is_absolute() {
            Ok(path_ref.to_path_buf())
        } else {
            Ok(self.root.join(path_ref))
        }
    }

    fn modified(&self, path: &str) -> Option<SystemTime> {
        let full = self.resolve(path).ok()?;
        std::fs::metadata(full).ok()?.modified().ok()
    }
}

impl FileStore for DiskStore {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, IoError> {
        let full = self.resolve(path)?;
        std::fs::read(&full).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(path.to_string()),
            _ => IoError::StdIo(err),
        })
    }

    fn save_file(&self, path: &str, data: &[u8]) -> Result<(), IoError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, data)?;
        Ok(())
    }

    fn compare_file_time(&self, a: &str, b: &str) -> Option<Ordering> {
        Some(self.modified(a)?.cmp(&self.modified(b)?))
    }
}

/// In-memory files with a logical clock for modification times.
///
/// Every write stamps the file with the next tick, so a later write is always
/// newer than an earlier one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, (Vec<u8>, u64)>>,
    clock: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    fn files(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Vec<u8>, u64)>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `data` at `path` as the newest file.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        let stamp = self.tick();
        self.files().insert(path.to_string(), (data.into(), stamp));
    }

    /// Mark `path` as modified now. Returns `false` if it does not exist.
    pub fn touch(&self, path: &str) -> bool {
        let stamp = self.tick();
        match self.files().get_mut(path) {
            Some(entry) => {
                entry.1 = stamp;
                true
            },
            None => false,
        }
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files().remove(path).map(|(data, _)| data)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }
}

impl FileStore for MemoryStore {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, IoError> {
        self.files()
            .get(path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| IoError::NotFound(path.to_string()))
    }

    fn save_file(&self, path: &str, data: &[u8]) -> Result<(), IoError> {
        if path.is_empty() {
            return Err(IoError::MalformedPath(path.to_string()));
        }
        self.insert(path, data);
        Ok(())
    }

    fn compare_file_time(&self, a: &str, b: &str) -> Option<Ordering> {
        let files = self.files();
        let (_, ta) = files.get(a)?;
        let (_, tb) = files.get(b)?;
        Some(ta.cmp(tb))
    }
}
