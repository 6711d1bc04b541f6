//! Switching the checked-out commit.

use biogit_ref::RefName;

use crate::{RepoError, Repository};

impl Repository {
    /// Switch to a branch, tag, or commit.
    ///
    /// Branch names reattach `HEAD`; anything else (tag, hash, prefix)
    /// detaches it. Refuses when local modifications would be lost.
    pub fn switch(&self, target: &str) -> Result<(), RepoError> {
        let branch = RefName::branch(target)
            .ok()
            .filter(|name| matches!(self.refs().read(name), Ok(Some(_))));

        let commit_oid = match &branch {
            Some(name) => self
                .refs()
                .resolve(name)?
                .ok_or_else(|| RepoError::UnknownRevision(target.to_string()))?,
            None => self.resolve_revision(target)?,
        };

        let commit = self.store().read_commit(&commit_oid)?;
        let baseline = self.head_tree_map()?;
        let target_map = self.checkout_tree(&commit.tree, &baseline)?;

        let mut index = self.index_from_map(&target_map)?;
        self.write_index(&mut index)?;

        match branch {
            Some(name) => self.refs().set_head_to_branch(&name)?,
            None => self.refs().set_head_detached(&commit_oid)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
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

    fn commit_file(dir: &TempDir, repo: &Repository, name: &str, content: &str, msg: &str) {
        fs::write(dir.path().join(name), content).unwrap();
        repo.add_paths(dir.path(), &[PathBuf::from(name)]).unwrap();
        repo.commit(msg).unwrap();
    }

    #[test]
    fn switch_between_branches_updates_workdir_and_index() {
        let (dir, repo) = repo();
        commit_file(&dir, &repo, "hello.txt", "hi\n", "one");

        repo.branch_create("dev", None).unwrap();
        repo.switch("dev").unwrap();
        commit_file(&dir, &repo, "hello.txt", "hi there\n", "two");

        repo.switch("main").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("hello.txt")).unwrap(), "hi\n");
        assert_eq!(repo.refs().current_branch().unwrap().unwrap().short(), "main");

        // Index agrees with main's tree.
        let status = repo.status().unwrap();
        assert!(status.is_clean(), "unexpected entries: {:?}", status.entries);

        repo.switch("dev").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
            "hi there\n"
        );
    }

    #[test]
    fn switch_to_commit_detaches() {
        let (dir, repo) = repo();
        commit_file(&dir, &repo, "a.txt", "1\n", "one");
        let first = repo.head_commit().unwrap().unwrap();
        commit_file(&dir, &repo, "a.txt", "2\n", "two");

        repo.switch(&first.to_hex()).unwrap();
        assert_eq!(repo.refs().current_branch().unwrap(), None);
        assert_eq!(repo.head_commit().unwrap(), Some(first));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "1\n");
    }

    #[test]
    fn switch_by_unique_prefix() {
        let (dir, repo) = repo();
        commit_file(&dir, &repo, "a.txt", "1\n", "one");
        let first = repo.head_commit().unwrap().unwrap();
        commit_file(&dir, &repo, "a.txt", "2\n", "two");

        repo.switch(&first.to_hex()[..8]).unwrap();
        assert_eq!(repo.head_commit().unwrap(), Some(first));
    }

    #[test]
    fn switch_refuses_dirty_worktree() {
        let (dir, repo) = repo();
        commit_file(&dir, &repo, "a.txt", "1\n", "one");
        repo.branch_create("dev", None).unwrap();
        commit_file(&dir, &repo, "a.txt", "2\n", "two");

        fs::write(dir.path().join("a.txt"), "local edit\n").unwrap();
        assert!(matches!(
            repo.switch("dev"),
            Err(RepoError::WorkingDirectoryDirty(_))
        ));
        // Nothing was clobbered.
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "local edit\n"
        );
    }

    #[test]
    fn switch_unknown_target_fails() {
        let (dir, repo) = repo();
        commit_file(&dir, &repo, "a.txt", "1\n", "one");
        assert!(matches!(
            repo.switch("nope"),
            Err(RepoError::UnknownRevision(_))
        ));
    }
}
