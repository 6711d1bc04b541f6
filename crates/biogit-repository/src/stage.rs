//! Staging operations: `add` and `rm`.

use std::fs;
use std::path::{Path, PathBuf};

use bstr::{BString, ByteSlice};
use biogit_index::IndexEntry;
use biogit_object::{Blob, Object};

use crate::paths::{normalize_rel_path, workdir_file_path};
use crate::worktree::{file_mode, hash_file};
use crate::{RepoError, Repository, BIOGIT_DIR};

impl Repository {
    /// Stage files for the next commit.
    ///
    /// Directories are staged recursively. A path that no longer exists on
    /// disk but is tracked stages its deletion.
    pub fn add_paths(&self, cwd: &Path, paths: &[PathBuf]) -> Result<(), RepoError> {
        let work_dir = self.require_work_dir()?.to_path_buf();
        let mut index = self.load_index()?;

        for given in paths {
            let rel = normalize_rel_path(&work_dir, cwd, given)?;
            let fs_path = workdir_file_path(&work_dir, rel.as_bstr());

            if fs_path.is_dir() {
                let mut any = false;
                stage_directory(self, &work_dir, &fs_path, &mut index, &mut any)?;
                if !any && index.get(rel.as_bstr()).is_none() {
                    return Err(RepoError::PathspecUnmatched(given.display().to_string()));
                }
            } else if fs_path.is_file() {
                stage_file(self, &rel, &fs_path, &mut index)?;
            } else if index.get(rel.as_bstr()).is_some() {
                // Tracked but gone from disk: stage the deletion.
                index.remove(rel.as_bstr());
            } else {
                return Err(RepoError::PathspecUnmatched(given.display().to_string()));
            }

            // Staging a conflicted path marks it resolved.
            self.clear_conflict(&rel)?;
        }

        self.write_index(&mut index)
    }

    /// Stage the entire working tree (the `add .` form), including
    /// deletions of tracked files that vanished.
    pub fn add_all(&self) -> Result<(), RepoError> {
        let work_dir = self.require_work_dir()?.to_path_buf();
        let mut index = self.load_index()?;

        let gone: Vec<BString> = index
            .iter()
            .filter(|e| !workdir_file_path(&work_dir, e.path.as_bstr()).is_file())
            .map(|e| e.path.clone())
            .collect();
        for path in &gone {
            index.remove(path.as_bstr());
        }

        let mut any = false;
        stage_directory(self, &work_dir, &work_dir, &mut index, &mut any)?;

        // Everything is staged, so every recorded conflict is resolved.
        for path in self.conflicted_paths()? {
            self.clear_conflict(&path)?;
        }

        self.write_index(&mut index)
    }

    /// Remove files from the index and (unless `cached`) the working tree.
    ///
    /// Refuses when the file has staged or unstaged changes, so content is
    /// never lost silently.
    pub fn rm_paths(&self, cwd: &Path, paths: &[PathBuf], cached: bool) -> Result<(), RepoError> {
        let work_dir = self.require_work_dir()?.to_path_buf();
        let mut index = self.load_index()?;
        let head_map = self.head_tree_map()?;

        // Validate everything before mutating anything.
        let mut targets: Vec<BString> = Vec::new();
        for given in paths {
            let rel = normalize_rel_path(&work_dir, cwd, given)?;
            let entry = index
                .get(rel.as_bstr())
                .ok_or_else(|| RepoError::PathspecUnmatched(given.display().to_string()))?;

            let fs_path = workdir_file_path(&work_dir, rel.as_bstr());
            if fs_path.is_file() && hash_file(&fs_path)? != entry.oid {
                return Err(RepoError::WorkingDirectoryDirty(rel.to_string()));
            }
            if let Some((head_oid, _)) = head_map.get(&rel) {
                if *head_oid != entry.oid {
                    return Err(RepoError::WorkingDirectoryDirty(rel.to_string()));
                }
            }
            targets.push(rel);
        }

        for rel in &targets {
            index.remove(rel.as_bstr());
            if !cached {
                let fs_path = workdir_file_path(&work_dir, rel.as_bstr());
                if fs_path.is_file() {
                    fs::remove_file(&fs_path)?;
                }
            }
        }

        self.write_index(&mut index)
    }
}

fn stage_file(
    repo: &Repository,
    rel: &BString,
    fs_path: &Path,
    index: &mut biogit_index::Index,
) -> Result<(), RepoError> {
    let data = fs::read(fs_path)?;
    let oid = repo.store().write(&Object::Blob(Blob::new(data)))?;
    let meta = fs::metadata(fs_path)?;
    index.add_or_update(IndexEntry::from_metadata(
        rel.clone(),
        oid,
        file_mode(&meta),
        &meta,
    ));
    Ok(())
}

fn stage_directory(
    repo: &Repository,
    work_dir: &Path,
    dir: &Path,
    index: &mut biogit_index::Index,
    any: &mut bool,
) -> Result<(), RepoError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        if name == BIOGIT_DIR {
            continue;
        }
        if entry.file_type()?.is_dir() {
            stage_directory(repo, work_dir, &path, index, any)?;
        } else if entry.file_type()?.is_file() {
            let rel = normalize_rel_path(work_dir, work_dir, &path)?;
            stage_file(repo, &rel, &path, index)?;
            *any = true;
        }
    }
    Ok(())
}
