//! Working tree / index / HEAD classification.

use std::collections::BTreeSet;
use std::fs;

use bstr::{BString, ByteSlice};
use biogit_hash::ObjectId;

use crate::paths::workdir_file_path;
use crate::worktree::hash_file;
use crate::{RepoError, Repository, BIOGIT_DIR};

/// Classification of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Unmodified,
    StagedNew,
    StagedModified,
    StagedDeleted,
    WorkdirModified,
    Untracked,
}

/// One classified path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: BString,
    pub kind: StatusKind,
}

/// A full status report.
#[derive(Debug, Clone)]
pub struct Status {
    /// Current branch short name, or `None` when detached.
    pub branch: Option<String>,
    /// `HEAD` commit when detached.
    pub detached: Option<ObjectId>,
    /// Whether a merge is in progress (`MERGE_HEAD` exists).
    pub merge_in_progress: bool,
    /// Paths still conflicted from the merge.
    pub conflicts: Vec<BString>,
    /// Changed paths; unmodified paths are omitted.
    pub entries: Vec<StatusEntry>,
}

impl Status {
    /// Whether nothing is staged, modified, or untracked.
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty() && self.conflicts.is_empty()
    }
}

impl Repository {
    /// Classify every path across HEAD, the index, and the working tree.
    ///
    /// The working tree comparison uses `(size, mtime)` as a cheap filter;
    /// files that fail it are re-hashed before being reported as modified.
    pub fn status(&self) -> Result<Status, RepoError> {
        let work_dir = self.require_work_dir()?.to_path_buf();
        let index = self.load_index()?;
        let head_map = self.head_tree_map()?;

        let mut entries = Vec::new();

        // Staged side: index vs HEAD.
        for entry in index.iter() {
            match head_map.get(&entry.path) {
                None => entries.push(StatusEntry {
                    path: entry.path.clone(),
                    kind: StatusKind::StagedNew,
                }),
                Some((head_oid, head_mode)) => {
                    if *head_oid != entry.oid || *head_mode != entry.mode {
                        entries.push(StatusEntry {
                            path: entry.path.clone(),
                            kind: StatusKind::StagedModified,
                        });
                    }
                }
            }
        }
        for path in head_map.keys() {
            if index.get(path.as_bstr()).is_none() {
                entries.push(StatusEntry {
                    path: path.clone(),
                    kind: StatusKind::StagedDeleted,
                });
            }
        }

        // Workdir side: working tree vs index.
        for entry in index.iter() {
            let fs_path = workdir_file_path(&work_dir, entry.path.as_bstr());
            let meta = match fs::metadata(&fs_path) {
                Ok(meta) if meta.is_file() => meta,
                _ => {
                    entries.push(StatusEntry {
                        path: entry.path.clone(),
                        kind: StatusKind::WorkdirModified,
                    });
                    continue;
                }
            };
            if entry.matches_stat(&meta) {
                continue;
            }
            // Suspected change: confirm by re-hashing.
            if hash_file(&fs_path)? != entry.oid {
                entries.push(StatusEntry {
                    path: entry.path.clone(),
                    kind: StatusKind::WorkdirModified,
                });
            }
        }

        // Untracked files.
        let mut workdir_files: BTreeSet<BString> = BTreeSet::new();
        collect_files(&work_dir, &work_dir, &mut workdir_files)?;
        for path in workdir_files {
            if index.get(path.as_bstr()).is_none() {
                entries.push(StatusEntry {
                    path,
                    kind: StatusKind::Untracked,
                });
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let branch = self.refs().current_branch()?.map(|n| n.short().to_string());
        let detached = match branch {
            Some(_) => None,
            None => self.head_commit()?,
        };

        Ok(Status {
            branch,
            detached,
            merge_in_progress: self.merge_head()?.is_some(),
            conflicts: self.conflicted_paths()?,
            entries,
        })
    }
}

fn collect_files(
    work_dir: &std::path::Path,
    dir: &std::path::Path,
    out: &mut BTreeSet<BString>,
) -> Result<(), RepoError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == BIOGIT_DIR {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(work_dir, &path, out)?;
        } else if entry.file_type()?.is_file() {
            if let Ok(rel) = path.strip_prefix(work_dir) {
                if let Some(s) = rel.to_str() {
                    out.insert(BString::from(s.replace('\\', "/")));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

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

    fn kinds(status: &Status) -> Vec<(String, StatusKind)> {
        status
            .entries
            .iter()
            .map(|e| (e.path.to_string(), e.kind))
            .collect()
    }

    #[test]
    fn fresh_repo_with_file_is_untracked() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("new.txt"), "n").unwrap();
        let status = repo.status().unwrap();
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(kinds(&status), [("new.txt".into(), StatusKind::Untracked)]);
    }

    #[test]
    fn staged_new_then_clean_after_commit() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("a.txt")]).unwrap();

        let status = repo.status().unwrap();
        assert_eq!(kinds(&status), [("a.txt".into(), StatusKind::StagedNew)]);

        repo.commit("m").unwrap();
        assert!(repo.status().unwrap().is_clean());
    }

    #[test]
    fn workdir_modification_detected_by_rehash() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("a.txt")]).unwrap();
        repo.commit("m").unwrap();

        fs::write(dir.path().join("a.txt"), "changed\n").unwrap();
        let status = repo.status().unwrap();
        assert_eq!(kinds(&status), [("a.txt".into(), StatusKind::WorkdirModified)]);
    }

    #[test]
    fn staged_modified_and_deleted() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        fs::write(dir.path().join("b.txt"), "b\n").unwrap();
        repo.add_all().unwrap();
        repo.commit("m").unwrap();

        fs::write(dir.path().join("a.txt"), "a2\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("a.txt")]).unwrap();
        repo.rm_paths(dir.path(), &[PathBuf::from("b.txt")], false).unwrap();

        let status = repo.status().unwrap();
        assert_eq!(
            kinds(&status),
            [
                ("a.txt".into(), StatusKind::StagedModified),
                ("b.txt".into(), StatusKind::StagedDeleted),
            ]
        );
    }

    #[test]
    fn missing_workdir_file_reports_modified() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from("a.txt")]).unwrap();
        repo.commit("m").unwrap();
        fs::remove_file(dir.path().join("a.txt")).unwrap();

        let status = repo.status().unwrap();
        assert_eq!(kinds(&status), [("a.txt".into(), StatusKind::WorkdirModified)]);
    }

    #[test]
    fn merge_state_reported() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        repo.add_all().unwrap();
        let oid = repo.commit("m").unwrap();

        repo.write_merge_state(&oid, &[BString::from("a.txt")]).unwrap();
        let status = repo.status().unwrap();
        assert!(status.merge_in_progress);
        assert_eq!(status.conflicts, [BString::from("a.txt")]);
    }
}
