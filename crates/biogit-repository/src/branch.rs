//! Branch and tag management.

use biogit_hash::ObjectId;
use biogit_ref::RefName;
use biogit_revwalk::is_ancestor;

use crate::{RepoError, Repository};

impl Repository {
    /// Branches with their tips, and whether each is checked out.
    pub fn branch_list(&self) -> Result<Vec<(String, ObjectId, bool)>, RepoError> {
        let current = self.refs().current_branch()?;
        Ok(self
            .refs()
            .list("refs/heads")?
            .into_iter()
            .map(|(name, oid)| {
                let is_current = current.as_ref() == Some(&name);
                (name.short().to_string(), oid, is_current)
            })
            .collect())
    }

    /// Create a branch at `at` (default: `HEAD`).
    pub fn branch_create(&self, name: &str, at: Option<&str>) -> Result<(), RepoError> {
        let full = RefName::branch(name)?;
        if self.refs().read(&full)?.is_some() {
            return Err(RepoError::BranchExists(name.to_string()));
        }
        let target = match at {
            Some(rev) => self.resolve_revision(rev)?,
            None => self.head_commit()?.ok_or(RepoError::UnbornHead)?,
        };
        Ok(self.refs().write_direct(&full, &target)?)
    }

    /// Delete a branch.
    ///
    /// Refuses the checked-out branch always, and an unmerged branch unless
    /// `force` is set.
    pub fn branch_delete(&self, name: &str, force: bool) -> Result<(), RepoError> {
        let full = RefName::branch(name)?;
        if self.refs().current_branch()?.as_ref() == Some(&full) {
            return Err(RepoError::BranchCheckedOut(name.to_string()));
        }
        let tip = match self.refs().resolve(&full)? {
            Some(tip) => tip,
            None => return Err(RepoError::BranchNotFound(name.to_string())),
        };

        if !force {
            let merged = match self.head_commit()? {
                Some(head) => is_ancestor(self.store(), &tip, &head)?,
                None => false,
            };
            if !merged {
                return Err(RepoError::BranchNotMerged(name.to_string()));
            }
        }

        self.refs().delete(&full)?;
        Ok(())
    }

    /// Tags with their targets.
    pub fn tag_list(&self) -> Result<Vec<(String, ObjectId)>, RepoError> {
        Ok(self
            .refs()
            .list("refs/tags")?
            .into_iter()
            .map(|(name, oid)| (name.short().to_string(), oid))
            .collect())
    }

    /// Create a lightweight tag at `at` (default: `HEAD`).
    pub fn tag_create(&self, name: &str, at: Option<&str>) -> Result<(), RepoError> {
        let full = RefName::tag(name)?;
        if self.refs().read(&full)?.is_some() {
            return Err(RepoError::TagExists(name.to_string()));
        }
        let target = match at {
            Some(rev) => self.resolve_revision(rev)?,
            None => self.head_commit()?.ok_or(RepoError::UnbornHead)?,
        };
        Ok(self.refs().write_direct(&full, &target)?)
    }

    /// Delete a tag.
    pub fn tag_delete(&self, name: &str) -> Result<(), RepoError> {
        let full = RefName::tag(name)?;
        if !self.refs().delete(&full)? {
            return Err(RepoError::TagNotFound(name.to_string()));
        }
        Ok(())
    }
}
