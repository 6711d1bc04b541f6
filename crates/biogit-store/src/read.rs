use std::fs;
use std::io::Read;

use flate2::read::ZlibDecoder;
use biogit_hash::ObjectId;
use biogit_object::{header, Blob, Commit, Object, ObjectType, Tree};

use crate::{ObjectStore, StoreError};

impl ObjectStore {
    /// Check if an object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read an object by OID.
    pub fn read(&self, oid: &ObjectId) -> Result<Object, StoreError> {
        let raw = self.read_serialized(oid)?;
        Ok(Object::parse(&raw)?)
    }

    /// Read and parse, expecting a blob.
    pub fn read_blob(&self, oid: &ObjectId) -> Result<Blob, StoreError> {
        match self.read(oid)? {
            Object::Blob(b) => Ok(b),
            other => Err(StoreError::Corrupt {
                oid: oid.to_hex(),
                reason: format!("expected blob, found {}", other.object_type()),
            }),
        }
    }

    /// Read and parse, expecting a tree.
    pub fn read_tree(&self, oid: &ObjectId) -> Result<Tree, StoreError> {
        match self.read(oid)? {
            Object::Tree(t) => Ok(t),
            other => Err(StoreError::Corrupt {
                oid: oid.to_hex(),
                reason: format!("expected tree, found {}", other.object_type()),
            }),
        }
    }

    /// Read and parse, expecting a commit.
    pub fn read_commit(&self, oid: &ObjectId) -> Result<Commit, StoreError> {
        match self.read(oid)? {
            Object::Commit(c) => Ok(c),
            other => Err(StoreError::Corrupt {
                oid: oid.to_hex(),
                reason: format!("expected commit, found {}", other.object_type()),
            }),
        }
    }

    /// Read the raw serialized form (`"<type> <size>\0<content>"`), the
    /// shape that travels on the wire.
    ///
    /// The declared size is verified against the body length.
    pub fn read_serialized(&self, oid: &ObjectId) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(oid);
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*oid));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let raw = decompress_all(&compressed, oid)?;

        let (_, size, header_len) = header::parse_header(&raw)?;
        if raw.len() - header_len != size {
            return Err(StoreError::Corrupt {
                oid: oid.to_hex(),
                reason: format!(
                    "declared size {} but body is {} bytes",
                    size,
                    raw.len() - header_len
                ),
            });
        }

        Ok(raw)
    }

    /// Read the type, declared size, and content of an object.
    pub fn read_parts(&self, oid: &ObjectId) -> Result<(ObjectType, usize, Vec<u8>), StoreError> {
        let raw = self.read_serialized(oid)?;
        let (obj_type, size, header_len) = header::parse_header(&raw)?;
        Ok((obj_type, size, raw[header_len..].to_vec()))
    }
}

/// Zlib-decompress the full contents of a loose object file.
fn decompress_all(compressed: &[u8], oid: &ObjectId) -> Result<Vec<u8>, StoreError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| StoreError::Decompress {
            oid: oid.to_hex(),
            source: e,
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use biogit_object::{FileMode, Signature, TreeEntry};
    use tempfile::TempDir;

    fn store() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::open(dir.path().join("objects"));
        (dir, store)
    }

    #[test]
    fn write_read_blob() {
        let (_dir, store) = store();
        let oid = store.write(&Object::Blob(Blob::new(b"hi\n".to_vec()))).unwrap();
        assert_eq!(oid.to_hex(), "45b983be36b73c0788dc9cbcb76cbb80fc7bb057");

        let blob = store.read_blob(&oid).unwrap();
        assert_eq!(blob.data, "hi\n");
    }

    #[test]
    fn write_is_idempotent() {
        let (_dir, store) = store();
        let obj = Object::Blob(Blob::new(b"same content".to_vec()));
        let a = store.write(&obj).unwrap();
        let b = store.write(&obj).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.read_serialized(&a).unwrap(), obj.serialize());
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_dir, store) = store();
        let oid = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert!(matches!(store.read(&oid), Err(StoreError::NotFound(_))));
        assert!(!store.contains(&oid));
    }

    #[test]
    fn tree_roundtrip_through_store() {
        let (_dir, store) = store();
        let blob_oid = store.write(&Object::Blob(Blob::new(b"x".to_vec()))).unwrap();
        let tree = Tree {
            entries: vec![TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("x.txt"),
                oid: blob_oid,
            }],
        };
        let tree_oid = store.write(&Object::Tree(tree.clone())).unwrap();
        assert_eq!(store.read_tree(&tree_oid).unwrap(), tree);
    }

    #[test]
    fn commit_roundtrip_through_store() {
        let (_dir, store) = store();
        let tree_oid = store.write(&Object::Tree(Tree::new())).unwrap();
        let sig = Signature::parse(bstr::BStr::new(b"A <a@b.c> 1234567890 +0000")).unwrap();
        let commit = Commit {
            tree: tree_oid,
            parents: vec![],
            author: sig.clone(),
            committer: sig,
            message: BString::from("m\n"),
        };
        let oid = store.write(&Object::Commit(commit.clone())).unwrap();
        assert_eq!(store.read_commit(&oid).unwrap(), commit);
    }

    #[test]
    fn wrong_type_read_is_corrupt() {
        let (_dir, store) = store();
        let oid = store.write(&Object::Blob(Blob::new(b"data".to_vec()))).unwrap();
        assert!(matches!(store.read_tree(&oid), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn write_serialized_verifies_hash() {
        let (_dir, store) = store();
        let obj = Object::Blob(Blob::new(b"payload".to_vec()));
        let raw = obj.serialize();
        let oid = obj.compute_oid().unwrap();

        assert_eq!(store.write_serialized(&oid, &raw).unwrap(), oid);

        let wrong = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        assert!(matches!(
            store.write_serialized(&wrong, &raw),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn read_parts_returns_header_fields() {
        let (_dir, store) = store();
        let oid = store.write(&Object::Blob(Blob::new(b"abc".to_vec()))).unwrap();
        let (ty, size, content) = store.read_parts(&oid).unwrap();
        assert_eq!(ty, ObjectType::Blob);
        assert_eq!(size, 3);
        assert_eq!(content, b"abc");
    }
}
