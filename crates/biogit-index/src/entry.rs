use bstr::{BStr, BString, ByteSlice};
use biogit_hash::ObjectId;
use biogit_object::FileMode;

/// A single staged file.
///
/// Line format: `<mode> <oid> <mtime_secs> <mtime_nanos> <size> <path>`.
/// The path comes last and runs to end of line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// File mode (regular or executable).
    pub mode: FileMode,
    /// Object ID of the staged blob.
    pub oid: ObjectId,
    /// File mtime, seconds part.
    pub mtime_secs: i64,
    /// File mtime, nanoseconds part.
    pub mtime_nanos: u32,
    /// File size in bytes.
    pub size: u64,
    /// Path relative to the working tree root, normalized to forward slashes.
    pub path: BString,
}

impl IndexEntry {
    /// Build an entry from file metadata.
    pub fn from_metadata(
        path: impl Into<BString>,
        oid: ObjectId,
        mode: FileMode,
        meta: &std::fs::Metadata,
    ) -> Self {
        let (secs, nanos) = mtime_parts(meta);
        Self {
            mode,
            oid,
            mtime_secs: secs,
            mtime_nanos: nanos,
            size: meta.len(),
            path: path.into(),
        }
    }

    /// Cheap change check against current file metadata.
    ///
    /// A match means the file is assumed unchanged; a mismatch means the
    /// caller should re-hash the content to be sure.
    pub fn matches_stat(&self, meta: &std::fs::Metadata) -> bool {
        let (secs, nanos) = mtime_parts(meta);
        self.size == meta.len() && self.mtime_secs == secs && self.mtime_nanos == nanos
    }

    /// Parse one index line.
    pub(crate) fn parse_line(line: &BStr) -> Result<Self, String> {
        let mut fields = line.splitn_str(6, " ");

        let mode = fields
            .next()
            .ok_or_else(|| "missing mode".to_string())
            .and_then(|f| FileMode::from_bytes(f).map_err(|e| e.to_string()))?;
        if mode.is_dir() {
            return Err("directory mode in index".to_string());
        }

        let oid = fields
            .next()
            .ok_or_else(|| "missing object id".to_string())
            .and_then(|f| {
                std::str::from_utf8(f)
                    .map_err(|_| "non-UTF8 object id".to_string())
                    .and_then(|s| ObjectId::from_hex(s).map_err(|e| e.to_string()))
            })?;

        let mtime_secs = parse_int::<i64>(fields.next(), "mtime seconds")?;
        let mtime_nanos = parse_int::<u32>(fields.next(), "mtime nanoseconds")?;
        let size = parse_int::<u64>(fields.next(), "size")?;

        let path = fields.next().ok_or_else(|| "missing path".to_string())?;
        if path.is_empty() {
            return Err("empty path".to_string());
        }

        Ok(Self {
            mode,
            oid,
            mtime_secs,
            mtime_nanos,
            size,
            path: BString::from(path),
        })
    }

    /// Append this entry's line (with trailing newline) to `out`.
    pub(crate) fn write_line(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            format!(
                "{} {} {} {} {} ",
                self.mode, self.oid, self.mtime_secs, self.mtime_nanos, self.size
            )
            .as_bytes(),
        );
        out.extend_from_slice(&self.path);
        out.push(b'\n');
    }
}

fn parse_int<T: std::str::FromStr>(field: Option<&[u8]>, what: &str) -> Result<T, String> {
    field
        .ok_or_else(|| format!("missing {what}"))
        .and_then(|f| {
            std::str::from_utf8(f)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| format!("invalid {what}"))
        })
}

fn mtime_parts(meta: &std::fs::Metadata) -> (i64, u32) {
    match meta.modified() {
        Ok(t) => match t.duration_since(std::time::UNIX_EPOCH) {
            Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => (-(e.duration().as_secs() as i64), 0),
        },
        Err(_) => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_roundtrip() {
        let line = b"100644 da39a3ee5e6b4b0d3255bfef95601890afd80709 1234 567 89 src/lib.rs";
        let entry = IndexEntry::parse_line(line.as_bstr()).unwrap();
        assert_eq!(entry.mode, FileMode::Regular);
        assert_eq!(entry.mtime_secs, 1234);
        assert_eq!(entry.mtime_nanos, 567);
        assert_eq!(entry.size, 89);
        assert_eq!(entry.path, "src/lib.rs");

        let mut out = Vec::new();
        entry.write_line(&mut out);
        assert_eq!(out, [line.as_slice(), b"\n"].concat());
    }

    #[test]
    fn path_with_spaces_survives() {
        let line = b"100755 da39a3ee5e6b4b0d3255bfef95601890afd80709 1 2 3 a b c.sh";
        let entry = IndexEntry::parse_line(line.as_bstr()).unwrap();
        assert_eq!(entry.path, "a b c.sh");
    }

    #[test]
    fn rejects_directory_mode() {
        // Directories are never staged directly; the tree builder creates them.
        let line = b"040000 da39a3ee5e6b4b0d3255bfef95601890afd80709 1 2 3 dir";
        assert!(IndexEntry::parse_line(line.as_bstr()).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(IndexEntry::parse_line(b"garbage".as_bstr()).is_err());
        assert!(IndexEntry::parse_line(b"100644 nothex 1 2 3 p".as_bstr()).is_err());
    }
}
