//! Creating commits from the staged index.

use bstr::BString;
use biogit_hash::ObjectId;
use biogit_object::{Commit, Object};
use biogit_ref::Reference;

use crate::tree_builder::build_tree;
use crate::{RepoError, Repository};

impl Repository {
    /// Commit the staged index with the given message.
    ///
    /// A pending merge (recorded in `MERGE_HEAD`) produces a two-parent
    /// commit and is refused while conflicts remain unresolved.
    pub fn commit(&self, message: &str) -> Result<ObjectId, RepoError> {
        let identity = self.identity()?;
        let index = self.load_index()?;
        let tree = build_tree(self.store(), index.entries())?;

        let head = self.head_commit()?;
        let merge_head = self.merge_head()?;

        if merge_head.is_some() {
            let conflicts = self.conflicted_paths()?;
            if let Some(first) = conflicts.first() {
                return Err(RepoError::UnresolvedConflicts(first.to_string()));
            }
        }

        let parents: Vec<ObjectId> = match (head, merge_head) {
            (Some(h), Some(m)) => vec![h, m],
            (Some(h), None) => {
                // Refuse empty commits on a born branch.
                let head_commit = self.store().read_commit(&h)?;
                if head_commit.tree == tree {
                    return Err(RepoError::NothingToCommit);
                }
                vec![h]
            }
            (None, Some(m)) => vec![m],
            (None, None) => {
                if index.is_empty() {
                    return Err(RepoError::NothingToCommit);
                }
                Vec::new()
            }
        };

        let mut message = BString::from(message);
        if !message.ends_with(b"\n") {
            message.push(b'\n');
        }

        let commit = Commit {
            tree,
            parents,
            author: identity.clone(),
            committer: identity,
            message,
        };
        let oid = self.store().write(&Object::Commit(commit))?;

        self.advance_head(&oid)?;
        self.clear_merge_state()?;
        Ok(oid)
    }

    /// Move the current branch (or a detached `HEAD`) to `oid`.
    pub fn advance_head(&self, oid: &ObjectId) -> Result<(), RepoError> {
        match self.refs().head()? {
            Some(Reference::Symbolic { target, .. }) => self.refs().write_direct(&target, oid)?,
            _ => self.refs().set_head_detached(oid)?,
        }
        Ok(())
    }
}
