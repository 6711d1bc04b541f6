//! Working directory reconciliation: transform the workdir to match a tree.

use std::collections::BTreeMap;
use std::fs;

use bstr::{BString, ByteSlice};
use biogit_hash::{Hasher, ObjectId};
use biogit_index::{Index, IndexEntry};
use biogit_object::FileMode;

use crate::paths::workdir_file_path;
use crate::tree_builder::tree_to_map;
use crate::{RepoError, Repository};

/// A `path -> (blob, mode)` snapshot of a tree.
pub type TreeMap = BTreeMap<BString, (ObjectId, FileMode)>;

impl Repository {
    /// Transform the working directory to match `target`, verifying against
    /// `baseline` (the files recorded by the current `HEAD`).
    ///
    /// Refuses with [`RepoError::WorkingDirectoryDirty`] before touching
    /// anything if a file that differs from the baseline would be
    /// overwritten or deleted. Returns the target's tree map so the caller
    /// can rebuild the index.
    pub fn checkout_tree(
        &self,
        target: &ObjectId,
        baseline: &TreeMap,
    ) -> Result<TreeMap, RepoError> {
        let work_dir = self.require_work_dir()?.to_path_buf();
        let target_map = tree_to_map(self.store(), target)?;

        // First pass: find every change the checkout would make and refuse
        // if it would destroy local modifications.
        for (path, (baseline_oid, _)) in baseline {
            if target_map.contains_key(path) {
                continue;
            }
            // Deleted by the checkout: only allowed when unmodified.
            let fs_path = workdir_file_path(&work_dir, path.as_bstr());
            if fs_path.is_file() && hash_file(&fs_path)? != *baseline_oid {
                return Err(RepoError::WorkingDirectoryDirty(path.to_string()));
            }
        }

        for (path, (target_oid, _)) in &target_map {
            let fs_path = workdir_file_path(&work_dir, path.as_bstr());
            if !fs_path.is_file() {
                continue;
            }
            let current = hash_file(&fs_path)?;
            if current == *target_oid {
                continue; // already the target content
            }
            match baseline.get(path) {
                Some((baseline_oid, _)) if current == *baseline_oid => {}
                // Modified tracked file, or an untracked file in the way.
                _ => return Err(RepoError::WorkingDirectoryDirty(path.to_string())),
            }
        }

        // Second pass: apply.
        for path in baseline.keys() {
            if target_map.contains_key(path) {
                continue;
            }
            let fs_path = workdir_file_path(&work_dir, path.as_bstr());
            if fs_path.is_file() {
                fs::remove_file(&fs_path)?;
                prune_empty_parents(&work_dir, &fs_path);
            }
        }

        for (path, (oid, mode)) in &target_map {
            self.write_workdir_file(path, oid, *mode)?;
        }

        Ok(target_map)
    }

    /// Write one blob into the working directory, creating parents.
    pub fn write_workdir_file(
        &self,
        path: &BString,
        oid: &ObjectId,
        mode: FileMode,
    ) -> Result<(), RepoError> {
        let work_dir = self.require_work_dir()?;
        let fs_path = workdir_file_path(work_dir, path.as_bstr());
        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = self.store().read_blob(oid)?;
        fs::write(&fs_path, &blob.data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let bits = if mode == FileMode::Executable { 0o755 } else { 0o644 };
            fs::set_permissions(&fs_path, fs::Permissions::from_mode(bits))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }

    /// Rebuild the index to exactly mirror a tree map, stat-ing the files
    /// just materialized in the working directory.
    pub fn index_from_map(&self, map: &TreeMap) -> Result<Index, RepoError> {
        let work_dir = self.require_work_dir()?;
        let mut index = Index::new();
        for (path, (oid, mode)) in map {
            let fs_path = workdir_file_path(work_dir, path.as_bstr());
            let meta = fs::metadata(&fs_path)?;
            index.add_or_update(IndexEntry::from_metadata(path.clone(), *oid, *mode, &meta));
        }
        Ok(index)
    }
}

/// Hash a working directory file as a blob.
pub fn hash_file(path: &std::path::Path) -> Result<ObjectId, RepoError> {
    let data = fs::read(path)?;
    Ok(Hasher::hash_object("blob", &data)?)
}

/// File mode of a working directory file (executable bit on Unix).
pub fn file_mode(meta: &fs::Metadata) -> FileMode {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 != 0 {
            return FileMode::Executable;
        }
    }
    let _ = meta;
    FileMode::Regular
}

/// Remove empty directories left behind by a deletion, up to the work root.
fn prune_empty_parents(work_dir: &std::path::Path, removed: &std::path::Path) {
    let mut dir = removed.parent().map(|p| p.to_path_buf());
    while let Some(d) = dir {
        if d == *work_dir {
            break;
        }
        if d.read_dir().map(|mut e| e.next().is_none()).unwrap_or(false) {
            let _ = fs::remove_dir(&d);
            dir = d.parent().map(|p| p.to_path_buf());
        } else {
            break;
        }
    }
}
