//! Asset store implementations.
//!
//! # Responsibility
//! - Define the minimal contract the host platform must provide.
//! - Offer a directory-backed store and an in-memory store.
//!
//! # Invariants
//! - Stores receive already-normalized paths (`""` is the root).
//! - Stores never write.

use super::normalize_path;
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Host-provided, read-only, path-addressed virtual filesystem.
pub trait AssetStore: Send + Sync {
    /// Lists child names directly below `path`.
    ///
    /// A missing directory or a file path yields an empty list.
    fn list(&self, path: &str) -> io::Result<Vec<String>>;

    /// Opens a sequential stream positioned at offset 0.
    ///
    /// Returns `io::ErrorKind::NotFound` when no file exists at `path`.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Returns the declared byte length of the file at `path`.
    fn length(&self, path: &str) -> io::Result<u64>;
}

/// Store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    fn file_path(&self, path: &str) -> io::Result<PathBuf> {
        let resolved = self.resolve(path);
        let metadata = fs::metadata(&resolved)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{path}` is not a file"),
            ));
        }
        Ok(resolved)
    }
}

impl AssetStore for DirAssetStore {
    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.file_path(path)?)?;
        Ok(Box::new(file))
    }

    fn length(&self, path: &str) -> io::Result<u64> {
        Ok(fs::metadata(self.file_path(path)?)?.len())
    }
}

/// Open/close counters of a [`MemoryAssetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleStats {
    pub opened: usize,
    pub closed: usize,
}

impl HandleStats {
    /// Number of streams currently open.
    pub fn open_handles(&self) -> usize {
        self.opened.saturating_sub(self.closed)
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Bytes(Arc<[u8]>),
    /// Yields the prefix, then fails the next read.
    Broken(Arc<[u8]>),
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Store holding assets in memory, e.g. `include_bytes!` bundles or fixtures.
///
/// Tracks how many streams were opened and closed.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    files: BTreeMap<String, MemoryEntry>,
    counters: Arc<Counters>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one asset, replacing any previous content at `path`.
    ///
    /// `path` is normalized like reader paths. Paths the reader would reject
    /// are skipped with a warning.
    pub fn insert(&mut self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) {
        self.put(path.as_ref(), MemoryEntry::Bytes(bytes.into().into()));
    }

    /// Builder form of [`MemoryAssetStore::insert`].
    pub fn with_asset(mut self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Registers an asset whose stream fails after yielding `prefix`.
    pub fn insert_broken(&mut self, path: impl AsRef<str>, prefix: impl Into<Vec<u8>>) {
        self.put(path.as_ref(), MemoryEntry::Broken(prefix.into().into()));
    }

    fn put(&mut self, path: &str, entry: MemoryEntry) {
        match normalize_path(path) {
            Ok(key) if !key.is_empty() => {
                self.files.insert(key, entry);
            }
            _ => warn!(
                "event=asset_insert module=asset status=skipped path={path:?} reason=invalid_path"
            ),
        }
    }

    pub fn handle_stats(&self) -> HandleStats {
        HandleStats {
            opened: self.counters.opened.load(Ordering::SeqCst),
            closed: self.counters.closed.load(Ordering::SeqCst),
        }
    }
}

impl AssetStore for MemoryAssetStore {
    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let children = self
            .files
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        Ok(children.into_iter().collect())
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let entry = self.files.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset at `{path}`"))
        })?;

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let (bytes, fail_at_end) = match entry {
            MemoryEntry::Bytes(bytes) => (Arc::clone(bytes), false),
            MemoryEntry::Broken(prefix) => (Arc::clone(prefix), true),
        };
        Ok(Box::new(TrackedReader {
            cursor: Cursor::new(bytes),
            fail_at_end,
            counters: Arc::clone(&self.counters),
        }))
    }

    fn length(&self, path: &str) -> io::Result<u64> {
        match self.files.get(path) {
            Some(MemoryEntry::Bytes(bytes)) => Ok(bytes.len() as u64),
            Some(MemoryEntry::Broken(_)) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("descriptor unavailable for `{path}`"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no asset at `{path}`"),
            )),
        }
    }
}

struct TrackedReader {
    cursor: Cursor<Arc<[u8]>>,
    fail_at_end: bool,
    counters: Arc<Counters>,
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.cursor.read(buf)?;
        if read == 0 && self.fail_at_end {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "asset stream truncated",
            ));
        }
        Ok(read)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}
