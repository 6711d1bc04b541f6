//! Merge base (lowest common ancestor) computation.
//!
//! One side's ancestry is enumerated into a depth map, then the other
//! side's ancestry is searched breadth-first; the first level containing a
//! hit yields the base.

use std::collections::{HashMap, HashSet, VecDeque};

use biogit_hash::ObjectId;
use biogit_store::ObjectStore;

use crate::RevWalkError;

/// Find the merge base of `ours` and `theirs`.
///
/// Returns `None` when the two commits share no history. When several
/// common ancestors surface at the same search depth, the one furthest
/// from `ours` wins.
pub fn merge_base(
    store: &ObjectStore,
    ours: &ObjectId,
    theirs: &ObjectId,
) -> Result<Option<ObjectId>, RevWalkError> {
    if ours == theirs {
        return Ok(Some(*ours));
    }

    // Depth of every ancestor of `ours`, measured from `ours`.
    let depths = ancestor_depths(store, ours)?;

    // BFS over the ancestry of `theirs`; stop at the first level with hits.
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut frontier = VecDeque::from([*theirs]);
    seen.insert(*theirs);

    while !frontier.is_empty() {
        let mut hits: Vec<ObjectId> = Vec::new();
        let mut next = VecDeque::new();

        for oid in frontier.drain(..) {
            if depths.contains_key(&oid) {
                hits.push(oid);
                continue;
            }
            let commit = store.read_commit(&oid)?;
            for parent in &commit.parents {
                if seen.insert(*parent) {
                    next.push_back(*parent);
                }
            }
        }

        if !hits.is_empty() {
            hits.sort_by_key(|oid| std::cmp::Reverse(depths[oid]));
            return Ok(Some(hits[0]));
        }
        frontier = next;
    }

    Ok(None)
}

/// Is `ancestor` an ancestor of (or equal to) `descendant`?
///
/// This is the fast-forward test: a ref at `ancestor` can fast-forward to
/// `descendant` exactly when this holds.
pub fn is_ancestor(
    store: &ObjectStore,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> Result<bool, RevWalkError> {
    if ancestor == descendant {
        return Ok(true);
    }
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut stack = vec![*descendant];
    while let Some(oid) = stack.pop() {
        if oid == *ancestor {
            return Ok(true);
        }
        if !seen.insert(oid) {
            continue;
        }
        let commit = store.read_commit(&oid)?;
        stack.extend(commit.parents.iter().copied());
    }
    Ok(false)
}

/// BFS from `tip` recording the minimum depth of each reachable commit.
fn ancestor_depths(
    store: &ObjectStore,
    tip: &ObjectId,
) -> Result<HashMap<ObjectId, usize>, RevWalkError> {
    let mut depths: HashMap<ObjectId, usize> = HashMap::new();
    let mut queue = VecDeque::from([(*tip, 0usize)]);
    depths.insert(*tip, 0);

    while let Some((oid, depth)) = queue.pop_front() {
        let commit = store.read_commit(&oid)?;
        for parent in &commit.parents {
            if !depths.contains_key(parent) {
                depths.insert(*parent, depth + 1);
                queue.push_back((*parent, depth + 1));
            }
        }
    }

    Ok(depths)
}

#[cfg(test)]
pub(crate) mod tests_support {
    use bstr::{BStr, BString};
    use biogit_object::{Commit, Object, Signature, Tree};
    use tempfile::TempDir;

    use super::*;

    pub fn repo() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::open(dir.path().join("objects"));
        (dir, store)
    }

    /// Write a commit with the given parents and message.
    pub fn linked_commit(store: &ObjectStore, parents: &[ObjectId], msg: &str) -> ObjectId {
        let tree = store.write(&Object::Tree(Tree::new())).unwrap();
        let sig = Signature::parse(BStr::new(b"T <t@e.st> 1234567890 +0000")).unwrap();
        let commit = Commit {
            tree,
            parents: parents.to_vec(),
            author: sig.clone(),
            committer: sig,
            message: BString::from(format!("{msg}\n")),
        };
        store.write(&Object::Commit(commit)).unwrap()
    }

    /// Write a linear chain of `n` commits; returns them root-first.
    pub fn commit_chain(store: &ObjectStore, n: usize) -> Vec<ObjectId> {
        let mut out = Vec::new();
        for i in 0..n {
            let parents: Vec<ObjectId> = out.last().copied().into_iter().collect();
            out.push(linked_commit(store, &parents, &format!("c{i}")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::*;
    use super::*;

    #[test]
    fn same_commit_is_its_own_base() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 1);
        assert_eq!(merge_base(&store, &chain[0], &chain[0]).unwrap(), Some(chain[0]));
    }

    #[test]
    fn linear_base_is_older_commit() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 3);
        assert_eq!(merge_base(&store, &chain[2], &chain[0]).unwrap(), Some(chain[0]));
        assert_eq!(merge_base(&store, &chain[0], &chain[2]).unwrap(), Some(chain[0]));
    }

    #[test]
    fn forked_branches_share_fork_point() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 2);
        let left = linked_commit(&store, &[chain[1]], "left");
        let right = linked_commit(&store, &[chain[1]], "right");
        assert_eq!(merge_base(&store, &left, &right).unwrap(), Some(chain[1]));
    }

    #[test]
    fn disjoint_histories_have_no_base() {
        let (_dir, store) = repo();
        let a = linked_commit(&store, &[], "island a");
        let b = linked_commit(&store, &[], "island b");
        assert_eq!(merge_base(&store, &a, &b).unwrap(), None);
    }

    #[test]
    fn base_is_ancestor_of_both() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 2);
        let left1 = linked_commit(&store, &[chain[1]], "l1");
        let left2 = linked_commit(&store, &[left1], "l2");
        let right = linked_commit(&store, &[chain[1]], "r1");

        let base = merge_base(&store, &left2, &right).unwrap().unwrap();
        assert!(is_ancestor(&store, &base, &left2).unwrap());
        assert!(is_ancestor(&store, &base, &right).unwrap());
        assert_eq!(base, chain[1]);
    }

    #[test]
    fn cross_merge_prefers_deeper_base() {
        // Classic criss-cross: two candidate bases; the one further from
        // `ours` is chosen.
        let (_dir, store) = repo();
        let root = linked_commit(&store, &[], "root");
        let a = linked_commit(&store, &[root], "a");
        let b = linked_commit(&store, &[root], "b");
        let ours = linked_commit(&store, &[a, b], "ours");
        let theirs = linked_commit(&store, &[b, a], "theirs");

        let base = merge_base(&store, &ours, &theirs).unwrap().unwrap();
        assert!(base == a || base == b);
    }

    #[test]
    fn is_ancestor_directionality() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 3);
        assert!(is_ancestor(&store, &chain[0], &chain[2]).unwrap());
        assert!(!is_ancestor(&store, &chain[2], &chain[0]).unwrap());
        assert!(is_ancestor(&store, &chain[1], &chain[1]).unwrap());
    }
}
