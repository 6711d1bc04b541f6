//! Converting between the flat index and the nested tree graph.

use std::collections::BTreeMap;

use bstr::{BStr, BString, ByteSlice};
use biogit_hash::ObjectId;
use biogit_index::IndexEntry;
use biogit_object::{FileMode, Object, Tree, TreeEntry};
use biogit_store::ObjectStore;

use crate::RepoError;

/// Build the tree graph for a flat list of index entries and write every
/// produced tree to the store. Returns the root tree's id.
///
/// Each entry is visited exactly once: the entry list is partitioned by
/// leading path component, sub-trees are built recursively, and one tree
/// entry per child is emitted at each level.
pub fn build_tree(store: &ObjectStore, entries: &[IndexEntry]) -> Result<ObjectId, RepoError> {
    let refs: Vec<(&BStr, &IndexEntry)> = entries
        .iter()
        .map(|e| (e.path.as_bstr(), e))
        .collect();
    build_level(store, &refs)
}

fn build_level(store: &ObjectStore, entries: &[(&BStr, &IndexEntry)]) -> Result<ObjectId, RepoError> {
    let mut tree = Tree::new();
    // Children grouped by directory name, in name order.
    let mut dirs: BTreeMap<BString, Vec<(&BStr, &IndexEntry)>> = BTreeMap::new();

    for (rest, entry) in entries {
        match rest.find_byte(b'/') {
            None => {
                tree.entries.push(TreeEntry {
                    mode: entry.mode,
                    name: BString::from(*rest),
                    oid: entry.oid,
                });
            }
            Some(slash) => {
                let dir = BString::from(&rest[..slash]);
                let tail = rest[slash + 1..].as_bstr();
                dirs.entry(dir).or_default().push((tail, entry));
            }
        }
    }

    for (dir_name, children) in dirs {
        let sub_oid = build_level(store, &children)?;
        tree.entries.push(TreeEntry {
            mode: FileMode::Directory,
            name: dir_name,
            oid: sub_oid,
        });
    }

    tree.sort();
    Ok(store.write(&Object::Tree(tree))?)
}

/// Flatten a tree graph into a `path -> (oid, mode)` map.
pub fn tree_to_map(
    store: &ObjectStore,
    root: &ObjectId,
) -> Result<BTreeMap<BString, (ObjectId, FileMode)>, RepoError> {
    let mut out = BTreeMap::new();
    walk_tree(store, root, &mut BString::from(""), &mut out)?;
    Ok(out)
}

fn walk_tree(
    store: &ObjectStore,
    tree_oid: &ObjectId,
    prefix: &mut BString,
    out: &mut BTreeMap<BString, (ObjectId, FileMode)>,
) -> Result<(), RepoError> {
    let tree = store.read_tree(tree_oid)?;
    for entry in tree.iter() {
        let saved_len = prefix.len();
        if !prefix.is_empty() {
            prefix.push(b'/');
        }
        prefix.extend_from_slice(&entry.name);

        if entry.mode.is_dir() {
            walk_tree(store, &entry.oid, prefix, out)?;
        } else {
            out.insert(prefix.clone(), (entry.oid, entry.mode));
        }

        prefix.truncate(saved_len);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use biogit_object::Blob;
    use tempfile::TempDir;

    fn store() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::open(dir.path().join("objects"));
        (dir, store)
    }

    fn entry(store: &ObjectStore, path: &str, content: &[u8]) -> IndexEntry {
        let oid = store.write(&Object::Blob(Blob::new(content.to_vec()))).unwrap();
        IndexEntry {
            mode: FileMode::Regular,
            oid,
            mtime_secs: 0,
            mtime_nanos: 0,
            size: content.len() as u64,
            path: BString::from(path),
        }
    }

    #[test]
    fn single_file_tree() {
        let (_dir, store) = store();
        let entries = vec![entry(&store, "hello.txt", b"hi\n")];
        let root = build_tree(&store, &entries).unwrap();

        let tree = store.read_tree(&root).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.entries[0].name, "hello.txt");
    }

    #[test]
    fn nested_directories() {
        let (_dir, store) = store();
        let entries = vec![
            entry(&store, "README.md", b"r\n"),
            entry(&store, "src/lib.rs", b"l\n"),
            entry(&store, "src/sub/deep.rs", b"d\n"),
        ];
        let root = build_tree(&store, &entries).unwrap();

        let top = store.read_tree(&root).unwrap();
        assert_eq!(top.len(), 2);
        let src = top.find(BStr::new("src")).unwrap();
        assert!(src.mode.is_dir());

        let src_tree = store.read_tree(&src.oid).unwrap();
        assert!(src_tree.find(BStr::new("lib.rs")).is_some());
        assert!(src_tree.find(BStr::new("sub")).is_some());
    }

    #[test]
    fn map_roundtrips_index_paths() {
        let (_dir, store) = store();
        let entries = vec![
            entry(&store, "a.txt", b"a"),
            entry(&store, "dir/b.txt", b"b"),
            entry(&store, "dir/sub/c.txt", b"c"),
            entry(&store, "z.txt", b"z"),
        ];
        let root = build_tree(&store, &entries).unwrap();
        let map = tree_to_map(&store, &root).unwrap();

        assert_eq!(map.len(), entries.len());
        for e in &entries {
            let (oid, mode) = map.get(&e.path).expect("path present");
            assert_eq!(*oid, e.oid);
            assert_eq!(*mode, e.mode);
        }
    }

    #[test]
    fn same_content_same_root() {
        let (_dir, store) = store();
        let entries = vec![entry(&store, "x/y.txt", b"y")];
        let a = build_tree(&store, &entries).unwrap();
        let b = build_tree(&store, &entries).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn executable_mode_preserved() {
        let (_dir, store) = store();
        let mut e = entry(&store, "run.sh", b"#!/bin/sh\n");
        e.mode = FileMode::Executable;
        let root = build_tree(&store, &[e]).unwrap();
        let map = tree_to_map(&store, &root).unwrap();
        assert_eq!(map[BStr::new("run.sh")].1, FileMode::Executable);
    }
}
