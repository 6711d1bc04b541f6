//! Producing file patches between the working tree, the index, and trees.

use std::collections::BTreeSet;
use std::fs;

use bstr::{BString, ByteSlice};
use biogit_diff::{diff_buffers, FilePatch};
use biogit_hash::ObjectId;

use crate::paths::workdir_file_path;
use crate::{RepoError, Repository};

/// Which two snapshots a diff compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// Working tree vs index (the default).
    WorkdirIndex,
    /// Index vs `HEAD` (`--staged`).
    IndexHead,
    /// One commit vs the working tree.
    CommitWorkdir(ObjectId),
    /// Tree of one commit vs tree of another.
    Commits(ObjectId, ObjectId),
}

impl Repository {
    /// Compute file patches for a diff target, optionally restricted to a
    /// path set.
    pub fn diff(
        &self,
        target: &DiffTarget,
        paths: &[BString],
        context: usize,
    ) -> Result<Vec<FilePatch>, RepoError> {
        let (old_side, new_side) = match target {
            DiffTarget::WorkdirIndex => (self.index_side()?, Side::Workdir),
            DiffTarget::IndexHead => (self.head_side()?, Side::Map(self.index_map()?)),
            DiffTarget::CommitWorkdir(commit) => (self.commit_side(commit)?, Side::Workdir),
            DiffTarget::Commits(old, new) => (self.commit_side(old)?, self.commit_side(new)?),
        };

        let mut all_paths: BTreeSet<BString> = BTreeSet::new();
        old_side.paths(self, &mut all_paths)?;
        new_side.paths(self, &mut all_paths)?;

        let mut patches = Vec::new();
        for path in all_paths {
            if !paths.is_empty() && !paths.iter().any(|p| *p == path) {
                continue;
            }
            let old = old_side.content(self, &path)?;
            let new = new_side.content(self, &path)?;
            if old == new {
                continue;
            }
            let hunks = diff_buffers(
                old.as_deref().unwrap_or(b""),
                new.as_deref().unwrap_or(b""),
                context,
            );
            if hunks.is_empty() {
                continue;
            }
            patches.push(FilePatch {
                old_path: old.is_some().then(|| path.clone()),
                new_path: new.is_some().then(|| path.clone()),
                hunks,
            });
        }
        Ok(patches)
    }

    fn index_map(&self) -> Result<crate::TreeMap, RepoError> {
        let index = self.load_index()?;
        Ok(index
            .iter()
            .map(|e| (e.path.clone(), (e.oid, e.mode)))
            .collect())
    }

    fn index_side(&self) -> Result<Side, RepoError> {
        Ok(Side::Map(self.index_map()?))
    }

    fn head_side(&self) -> Result<Side, RepoError> {
        Ok(Side::Map(self.head_tree_map()?))
    }

    fn commit_side(&self, oid: &ObjectId) -> Result<Side, RepoError> {
        let commit = self.store().read_commit(oid)?;
        Ok(Side::Map(crate::tree_to_map(self.store(), &commit.tree)?))
    }
}

/// One side of a diff: a blob map or the live working tree.
enum Side {
    Map(crate::TreeMap),
    Workdir,
}

impl Side {
    fn paths(&self, repo: &Repository, out: &mut BTreeSet<BString>) -> Result<(), RepoError> {
        match self {
            Side::Map(map) => out.extend(map.keys().cloned()),
            Side::Workdir => {
                // The workdir side only diffs tracked paths; untracked files
                // show up in status, not diff.
                let index = repo.load_index()?;
                out.extend(index.iter().map(|e| e.path.clone()));
            }
        }
        Ok(())
    }

    fn content(&self, repo: &Repository, path: &BString) -> Result<Option<Vec<u8>>, RepoError> {
        match self {
            Side::Map(map) => match map.get(path) {
                None => Ok(None),
                Some((oid, _)) => Ok(Some(repo.store().read_blob(oid)?.data.to_vec())),
            },
            Side::Workdir => {
                let fs_path = workdir_file_path(repo.require_work_dir()?, path.as_bstr());
                match fs::read(&fs_path) {
                    Ok(data) => Ok(Some(data)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(RepoError::Io(e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use biogit_diff::format_patch;
    use tempfile::TempDir;

    use super::*;

    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set("user.name", "Test").unwrap();
        config.set("user.email", "t@e.st").unwrap();
        config.write().unwrap();
        (dir, repo)
    }

    #[test]
    fn workdir_vs_index_shows_unstaged_edit() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("f.txt"), "a\nb\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("f.txt")]).unwrap();
        fs::write(dir.path().join("f.txt"), "a\nB\n").unwrap();

        let patches = repo.diff(&DiffTarget::WorkdirIndex, &[], 3).unwrap();
        assert_eq!(patches.len(), 1);
        let text = format_patch(&patches);
        assert!(text.contains("-b\n"));
        assert!(text.contains("+B\n"));
    }

    #[test]
    fn staged_diff_compares_index_to_head() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("f.txt"), "one\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("f.txt")]).unwrap();
        repo.commit("c1").unwrap();

        fs::write(dir.path().join("f.txt"), "two\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("f.txt")]).unwrap();

        // Nothing unstaged.
        assert!(repo.diff(&DiffTarget::WorkdirIndex, &[], 3).unwrap().is_empty());

        let staged = repo.diff(&DiffTarget::IndexHead, &[], 3).unwrap();
        let text = format_patch(&staged);
        assert!(text.contains("-one\n"));
        assert!(text.contains("+two\n"));
    }

    #[test]
    fn commit_vs_commit_diff() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("f.txt"), "1\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("f.txt")]).unwrap();
        let c1 = repo.commit("c1").unwrap();
        fs::write(dir.path().join("f.txt"), "2\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("f.txt")]).unwrap();
        let c2 = repo.commit("c2").unwrap();

        let patches = repo.diff(&DiffTarget::Commits(c1, c2), &[], 3).unwrap();
        let text = format_patch(&patches);
        assert!(text.contains("-1\n"));
        assert!(text.contains("+2\n"));
    }

    #[test]
    fn new_staged_file_is_a_creation_patch() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("f.txt"), "x\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("f.txt")]).unwrap();

        let staged = repo.diff(&DiffTarget::IndexHead, &[], 3).unwrap();
        assert_eq!(staged.len(), 1);
        assert!(staged[0].old_path.is_none());
        let text = format_patch(&staged);
        assert!(text.contains("--- /dev/null\n"));
        assert!(text.contains("@@ -0,0 +1,1 @@\n"));
    }

    #[test]
    fn path_filter_limits_output() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        fs::write(dir.path().join("b.txt"), "b\n").unwrap();
        repo.add_all().unwrap();

        let patches = repo
            .diff(&DiffTarget::IndexHead, &[BString::from("a.txt")], 3)
            .unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].new_path.as_ref().unwrap(), "a.txt");
    }
}
