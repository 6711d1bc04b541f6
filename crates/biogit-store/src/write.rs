use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use biogit_hash::{Hasher, ObjectId};
use biogit_object::{header, Object, ObjectType};

use crate::{ObjectStore, StoreError};

impl ObjectStore {
    /// Write an object to the store. Returns the OID.
    ///
    /// No-op if the object already exists (idempotent).
    /// The file is written atomically (temp file + rename).
    pub fn write(&self, obj: &Object) -> Result<ObjectId, StoreError> {
        let content = obj.serialize_content();
        self.write_raw(obj.object_type(), &content)
    }

    /// Write content bytes with a known type. Returns the OID.
    pub fn write_raw(&self, obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, StoreError> {
        let hdr = header::write_header(obj_type, content.len());

        let oid = {
            let mut hasher = Hasher::new();
            hasher.update(&hdr);
            hasher.update(content);
            hasher.finalize()?
        };

        if self.contains(&oid) {
            return Ok(oid);
        }

        let final_path = self.object_path(&oid);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = write_to_temp(&self.objects_dir, &hdr, content, self.compression_level)?;
        finalize_object(&tmp_path, &final_path)?;

        Ok(oid)
    }

    /// Write a serialized object (`"<type> <size>\0<content>"`) received
    /// from a peer, verifying it hashes to `expected`.
    ///
    /// The header is validated before anything touches disk.
    pub fn write_serialized(
        &self,
        expected: &ObjectId,
        raw: &[u8],
    ) -> Result<ObjectId, StoreError> {
        let actual = Hasher::digest(raw)?;
        if actual != *expected {
            return Err(StoreError::HashMismatch {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }

        let (obj_type, size, header_len) = header::parse_header(raw)?;
        let content = &raw[header_len..];
        if content.len() != size {
            return Err(StoreError::Corrupt {
                oid: expected.to_hex(),
                reason: format!("declared size {} but body is {} bytes", size, content.len()),
            });
        }

        self.write_raw(obj_type, content)
    }
}

/// Compress header + content into a temp file under `objects_dir`.
fn write_to_temp(
    objects_dir: &Path,
    hdr: &[u8],
    content: &[u8],
    level: flate2::Compression,
) -> Result<std::path::PathBuf, StoreError> {
    let tmp_path = objects_dir.join(format!(
        "tmp_obj_{}",
        std::process::id()
            ^ std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
    ));

    let file = fs::File::create(&tmp_path)?;
    let mut encoder = ZlibEncoder::new(file, level);
    encoder.write_all(hdr)?;
    encoder.write_all(content)?;
    encoder.finish()?;

    Ok(tmp_path)
}

/// Atomically move a temp file to its final destination.
///
/// If the destination already exists (race with another writer), the temp
/// file is removed and the write is treated as successful.
fn finalize_object(tmp: &Path, final_path: &Path) -> Result<(), StoreError> {
    match fs::rename(tmp, final_path) {
        Ok(()) => Ok(()),
        Err(_) if final_path.exists() => {
            let _ = fs::remove_file(tmp);
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(tmp);
            Err(StoreError::Io(e))
        }
    }
}
