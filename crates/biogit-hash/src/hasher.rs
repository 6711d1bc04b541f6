use crate::{HashError, ObjectId};

/// Streaming SHA-1 computation with collision detection.
///
/// Data can be fed incrementally with [`update`](Hasher::update) or through
/// the [`std::io::Write`] implementation, then finalised into an [`ObjectId`].
pub struct Hasher {
    inner: Box<sha1_checked::Sha1>,
}

impl Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        use digest::Digest;
        Self {
            inner: Box::new(sha1_checked::Sha1::new()),
        }
    }

    /// Feed data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        use digest::Digest;
        self.inner.update(data);
    }

    /// Finalize and return the ObjectId.
    ///
    /// Returns an error if SHA-1 collision detection fires.
    pub fn finalize(self) -> Result<ObjectId, HashError> {
        let result = self.inner.try_finalize();
        if result.has_collision() {
            return Err(HashError::Sha1Collision);
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(result.hash().as_slice());
        Ok(ObjectId::from_raw(bytes))
    }

    /// Convenience: hash data in one call.
    pub fn digest(data: &[u8]) -> Result<ObjectId, HashError> {
        let mut h = Self::new();
        h.update(data);
        h.finalize()
    }

    /// Hash an object: `"{type} {len}\0{content}"`.
    pub fn hash_object(obj_type: &str, content: &[u8]) -> Result<ObjectId, HashError> {
        let header = format!("{} {}\0", obj_type, content.len());
        let mut h = Self::new();
        h.update(header.as_bytes());
        h.update(content);
        h.finalize()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_empty() {
        let oid = Hasher::digest(b"").unwrap();
        assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn digest_abc() {
        let oid = Hasher::digest(b"abc").unwrap();
        assert_eq!(oid.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn incremental_matches_oneshot() {
        let mut h = Hasher::new();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finalize().unwrap(), Hasher::digest(b"hello world").unwrap());
    }

    #[test]
    fn hash_object_blob() {
        // SHA-1 of "blob 3\0hi\n" — the well-known hash of a two-byte file.
        let oid = Hasher::hash_object("blob", b"hi\n").unwrap();
        assert_eq!(oid.to_hex(), "45b983be36b73c0788dc9cbcb76cbb80fc7bb057");
    }

    #[test]
    fn write_impl() {
        use std::io::Write;
        let mut h = Hasher::new();
        h.write_all(b"abc").unwrap();
        assert_eq!(h.finalize().unwrap(), Hasher::digest(b"abc").unwrap());
    }
}
