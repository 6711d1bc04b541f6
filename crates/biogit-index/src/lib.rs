//! Index (staging area) for biogit.
//!
//! The index sits between the working tree and the object store, tracking
//! which files are staged for the next commit. It is a flat, path-sorted
//! list of entries persisted as plain text: one whitespace-separated line
//! per entry with the path last, so paths may contain spaces.

mod entry;

pub use entry::IndexEntry;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bstr::{BStr, BString, ByteSlice};

/// Errors from index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("corrupt index at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The staging area: a path-sorted list of file entries.
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from a file.
    ///
    /// A missing file is not an error — it yields an empty index.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(IndexError::Io(e)),
        };

        let mut entries = Vec::new();
        for (lineno, line) in data.split(|&b| b == b'\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            entries.push(IndexEntry::parse_line(line.as_bstr()).map_err(|reason| {
                IndexError::Corrupt {
                    line: lineno + 1,
                    reason,
                }
            })?);
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { entries })
    }

    /// Write the index to a file, sorted, via temp file + rename.
    pub fn write(&mut self, path: &Path) -> Result<(), IndexError> {
        self.entries.sort_by(|a, b| a.path.cmp(&b.path));

        let mut out = Vec::new();
        for entry in &self.entries {
            entry.write_line(&mut out);
        }

        let tmp: PathBuf = path.with_extension("lock");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&out)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Insert or replace the entry for a path.
    pub fn add_or_update(&mut self, entry: IndexEntry) {
        match self.entries.binary_search_by(|e| e.path.cmp(&entry.path)) {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Remove the entry for a path. Returns whether an entry was removed.
    pub fn remove(&mut self, path: &BStr) -> bool {
        match self.entries.binary_search_by(|e| e.path.as_bstr().cmp(path)) {
            Ok(i) => {
                self.entries.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Look up an entry by path.
    pub fn get(&self, path: &BStr) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by(|e| e.path.as_bstr().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Entries as a slice, path-sorted.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All paths, in order.
    pub fn paths(&self) -> Vec<BString> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }
}
