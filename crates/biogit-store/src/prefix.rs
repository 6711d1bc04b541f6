//! OID prefix resolution (short hex -> full OID with ambiguity detection).
//!
//! A prefix names at least the full shard directory, so only one directory
//! is ever enumerated.

use std::fs;

use biogit_hash::{hex, ObjectId};

use crate::{ObjectStore, StoreError, MIN_PREFIX_LEN};

impl ObjectStore {
    /// Resolve a hex prefix to a full OID.
    ///
    /// Requires at least [`MIN_PREFIX_LEN`] hex characters. Returns an error
    /// if no object matches or if the prefix is ambiguous.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<ObjectId, StoreError> {
        if prefix.len() < MIN_PREFIX_LEN {
            return Err(StoreError::PrefixTooShort(prefix.to_string()));
        }
        if prefix.len() > ObjectId::HEX_LEN || !hex::is_hex(prefix) {
            return Err(StoreError::PrefixNotFound(prefix.to_string()));
        }

        let prefix = prefix.to_ascii_lowercase();

        // A full 40-hex name needs only an existence check.
        if prefix.len() == ObjectId::HEX_LEN {
            let oid = ObjectId::from_hex(&prefix)?;
            if self.contains(&oid) {
                return Ok(oid);
            }
            return Err(StoreError::PrefixNotFound(prefix));
        }

        let shard = &prefix[..2];
        let rest = &prefix[2..];
        let shard_dir = self.objects_dir().join(shard);

        let entries = match fs::read_dir(&shard_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::PrefixNotFound(prefix));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut matches: Vec<ObjectId> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.len() != ObjectId::HEX_LEN - 2 || !name.starts_with(rest) {
                continue;
            }
            if let Ok(oid) = ObjectId::from_hex(&format!("{shard}{name}")) {
                matches.push(oid);
            }
        }

        match matches.len() {
            0 => Err(StoreError::PrefixNotFound(prefix)),
            1 => Ok(matches[0]),
            n => Err(StoreError::AmbiguousPrefix { prefix, count: n }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biogit_object::{Blob, Object};
    use tempfile::TempDir;

    fn store_with(objects: &[&[u8]]) -> (TempDir, ObjectStore, Vec<ObjectId>) {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::open(dir.path().join("objects"));
        let oids = objects
            .iter()
            .map(|data| store.write(&Object::Blob(Blob::new(data.to_vec()))).unwrap())
            .collect();
        (dir, store, oids)
    }

    #[test]
    fn resolves_unique_prefix() {
        let (_dir, store, oids) = store_with(&[b"one"]);
        let hex = oids[0].to_hex();
        assert_eq!(store.resolve_prefix(&hex[..8]).unwrap(), oids[0]);
    }

    #[test]
    fn resolves_full_hex() {
        let (_dir, store, oids) = store_with(&[b"one"]);
        assert_eq!(store.resolve_prefix(&oids[0].to_hex()).unwrap(), oids[0]);
    }

    #[test]
    fn rejects_short_prefix() {
        let (_dir, store, oids) = store_with(&[b"one"]);
        let hex = oids[0].to_hex();
        assert!(matches!(
            store.resolve_prefix(&hex[..5]),
            Err(StoreError::PrefixTooShort(_))
        ));
    }

    #[test]
    fn missing_prefix_not_found() {
        let (_dir, store, _) = store_with(&[b"one"]);
        assert!(matches!(
            store.resolve_prefix("0000000000"),
            Err(StoreError::PrefixNotFound(_))
        ));
    }

    #[test]
    fn uppercase_prefix_accepted() {
        let (_dir, store, oids) = store_with(&[b"one"]);
        let hex = oids[0].to_hex()[..10].to_uppercase();
        assert_eq!(store.resolve_prefix(&hex).unwrap(), oids[0]);
    }

    #[test]
    fn non_hex_prefix_not_found() {
        let (_dir, store, _) = store_with(&[b"one"]);
        assert!(store.resolve_prefix("zzzzzz").is_err());
    }
}
