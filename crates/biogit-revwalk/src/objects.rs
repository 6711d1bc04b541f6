//! Reachability closures for push negotiation.

use std::collections::HashSet;

use biogit_hash::ObjectId;
use biogit_object::Object;
use biogit_store::ObjectStore;

use crate::RevWalkError;

/// Commits reachable from `tip` but not from `exclude`.
///
/// `exclude` of `None` means the whole history of `tip`. The result is in
/// discovery (tip-first) order.
pub fn commits_between(
    store: &ObjectStore,
    tip: &ObjectId,
    exclude: Option<&ObjectId>,
) -> Result<Vec<ObjectId>, RevWalkError> {
    let mut excluded: HashSet<ObjectId> = HashSet::new();
    if let Some(exclude) = exclude {
        // The remote tip may be unknown locally (e.g. someone else pushed);
        // in that case nothing can be excluded and the caller's
        // compare-and-set on the ref catches the race.
        if store.contains(exclude) {
            let mut stack = vec![*exclude];
            while let Some(oid) = stack.pop() {
                if !excluded.insert(oid) {
                    continue;
                }
                let commit = store.read_commit(&oid)?;
                stack.extend(commit.parents.iter().copied());
            }
        }
    }

    let mut out = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut stack = vec![*tip];
    while let Some(oid) = stack.pop() {
        if excluded.contains(&oid) || !seen.insert(oid) {
            continue;
        }
        let commit = store.read_commit(&oid)?;
        for parent in &commit.parents {
            if !seen.contains(parent) && !excluded.contains(parent) {
                stack.push(*parent);
            }
        }
        out.push(oid);
    }

    Ok(out)
}

/// Every tree and blob reachable from a tree, including the tree itself.
pub fn tree_closure(store: &ObjectStore, tree: &ObjectId) -> Result<Vec<ObjectId>, RevWalkError> {
    let mut out = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut stack = vec![*tree];

    while let Some(oid) = stack.pop() {
        if !seen.insert(oid) {
            continue;
        }
        out.push(oid);
        if let Object::Tree(tree) = store.read(&oid)? {
            for entry in tree.iter() {
                if entry.mode.is_dir() {
                    stack.push(entry.oid);
                } else if seen.insert(entry.oid) {
                    out.push(entry.oid);
                }
            }
        }
    }

    Ok(out)
}

/// Expand a commit set to every object (commit, tree, blob) it references.
///
/// This is the candidate set offered to `check-objects` during a push.
pub fn collect_objects_for_push(
    store: &ObjectStore,
    commits: &[ObjectId],
) -> Result<Vec<ObjectId>, RevWalkError> {
    let mut out = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();

    for commit_oid in commits {
        if !seen.insert(*commit_oid) {
            continue;
        }
        out.push(*commit_oid);
        let commit = store.read_commit(commit_oid)?;
        for oid in tree_closure(store, &commit.tree)? {
            if seen.insert(oid) {
                out.push(oid);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use bstr::BString;
    use biogit_object::{Blob, Commit, FileMode, Object, Signature, Tree, TreeEntry};

    use super::*;
    use crate::merge_base::tests_support::{commit_chain, linked_commit, repo};

    #[test]
    fn commits_between_excludes_shared_history() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 3);
        let between = commits_between(&store, &chain[2], Some(&chain[0])).unwrap();
        assert_eq!(between, vec![chain[2], chain[1]]);
    }

    #[test]
    fn commits_between_full_history_without_exclude() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 2);
        let all = commits_between(&store, &chain[1], None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn commits_between_unknown_exclude_sends_everything() {
        let (_dir, store) = repo();
        let chain = commit_chain(&store, 2);
        let ghost = ObjectId::from_hex("00000000000000000000000000000000000000aa").unwrap();
        let all = commits_between(&store, &chain[1], Some(&ghost)).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn push_closure_covers_commit_tree_blob() {
        let (_dir, store) = repo();

        let blob = store.write(&Object::Blob(Blob::new(b"content".to_vec()))).unwrap();
        let subtree = store
            .write(&Object::Tree(Tree {
                entries: vec![TreeEntry {
                    mode: FileMode::Regular,
                    name: BString::from("file.txt"),
                    oid: blob,
                }],
            }))
            .unwrap();
        let root = store
            .write(&Object::Tree(Tree {
                entries: vec![TreeEntry {
                    mode: FileMode::Directory,
                    name: BString::from("dir"),
                    oid: subtree,
                }],
            }))
            .unwrap();
        let sig = Signature::parse(bstr::BStr::new(b"T <t@e.st> 1 +0000")).unwrap();
        let commit = store
            .write(&Object::Commit(Commit {
                tree: root,
                parents: vec![],
                author: sig.clone(),
                committer: sig,
                message: BString::from("m\n"),
            }))
            .unwrap();

        let objects = collect_objects_for_push(&store, &[commit]).unwrap();
        for oid in [commit, root, subtree, blob] {
            assert!(objects.contains(&oid), "{oid} missing from closure");
        }
        assert_eq!(objects.len(), 4);
    }

    #[test]
    fn closure_deduplicates_shared_blobs() {
        let (_dir, store) = repo();
        let a = linked_commit(&store, &[], "a");
        let b = linked_commit(&store, &[a], "b");
        // Both commits share the same empty tree object.
        let objects = collect_objects_for_push(&store, &[b, a]).unwrap();
        assert_eq!(objects.len(), 3); // two commits + one shared tree
    }
}
