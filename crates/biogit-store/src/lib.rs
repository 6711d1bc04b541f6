//! Loose object storage: read, write, and resolve zlib-compressed objects.
//!
//! Each object lives at `objects/XX/YYYY...` where `XX` is the first two hex
//! characters of the OID and `YYYY...` is the remaining 38. The file content
//! is zlib-compressed `"<type> <size>\0<content>"`. Objects are immutable
//! once written; writes are idempotent by content address.

mod prefix;
mod read;
mod write;

use std::path::{Path, PathBuf};

use biogit_hash::ObjectId;

/// Minimum hex prefix length accepted by [`ObjectStore::resolve_prefix`].
pub const MIN_PREFIX_LEN: usize = 6;

/// Interface to the loose object directory.
pub struct ObjectStore {
    /// Path to the objects directory.
    objects_dir: PathBuf,
    /// Zlib compression level.
    compression_level: flate2::Compression,
}

impl ObjectStore {
    /// Open the object store at the given path.
    pub fn open(objects_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            compression_level: flate2::Compression::default(),
        }
    }

    /// Get the file path for a given OID.
    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.shard_path())
    }

    /// Path to the objects directory itself.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object {0} not found")]
    NotFound(ObjectId),

    #[error("no object matches prefix {0:?}")]
    PrefixNotFound(String),

    #[error("prefix {prefix:?} is ambiguous ({count} matches)")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error("prefix {0:?} is too short (minimum 6 hex characters)")]
    PrefixTooShort(String),

    #[error("corrupt object {oid}: {reason}")]
    Corrupt { oid: String, reason: String },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("object parse error: {0}")]
    Object(#[from] biogit_object::ObjectError),

    #[error("hash error: {0}")]
    Hash(#[from] biogit_hash::HashError),
}
