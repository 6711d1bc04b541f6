//! Three-way merge engine: lowest-common-ancestor discovery, fast-forward
//! handling, tree-level reconciliation, and conflict-marker emission.

mod content;

pub use content::{merge_content, ContentMerge};

use std::collections::BTreeSet;
use std::fs;

use bstr::{BString, ByteSlice};
use biogit_hash::ObjectId;
use biogit_index::{Index, IndexEntry};
use biogit_object::{Blob, FileMode, Object};
use biogit_repository::{
    tree_to_map, workdir_file_path, RepoError, Repository, StatusKind, TreeMap,
};
use biogit_revwalk::merge_base;

/// Errors from merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("a merge is already in progress (commit or resolve it first)")]
    MergeInProgress,

    #[error("cannot merge: no commits on the current branch")]
    UnbornHead,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// How a merge concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The target is already reachable from `HEAD`.
    AlreadyUpToDate,
    /// `HEAD` was behind the target; the branch pointer moved.
    FastForward(ObjectId),
    /// A merge commit was created.
    Merged(ObjectId),
    /// Conflicts were written to the working tree; no commit was made.
    Conflicts(Vec<BString>),
}

/// Merge `target_rev` into the current branch.
pub fn merge(
    repo: &Repository,
    target_rev: &str,
    message: Option<&str>,
) -> Result<MergeOutcome, MergeError> {
    if repo.merge_head()?.is_some() {
        return Err(MergeError::MergeInProgress);
    }
    let ours_oid = repo.head_commit()?.ok_or(MergeError::UnbornHead)?;
    let theirs_oid = repo.resolve_revision(target_rev)?;

    // Local modifications (staged or unstaged) block a merge.
    let status = repo.status()?;
    if let Some(entry) = status
        .entries
        .iter()
        .find(|e| e.kind != StatusKind::Untracked)
    {
        return Err(RepoError::WorkingDirectoryDirty(entry.path.to_string()).into());
    }

    let base = merge_base(repo.store(), &ours_oid, &theirs_oid).map_err(RepoError::from)?;

    if base == Some(theirs_oid) {
        return Ok(MergeOutcome::AlreadyUpToDate);
    }
    if base == Some(ours_oid) {
        return fast_forward(repo, &theirs_oid);
    }

    three_way(repo, &ours_oid, &theirs_oid, base.as_ref(), target_rev, message)
}

/// Fast-forward: move the ref and reconcile workdir + index to the target.
fn fast_forward(repo: &Repository, theirs: &ObjectId) -> Result<MergeOutcome, MergeError> {
    let commit = repo.store().read_commit(theirs).map_err(RepoError::from)?;
    let baseline = repo.head_tree_map()?;
    let target_map = repo.checkout_tree(&commit.tree, &baseline)?;

    let mut index = repo.index_from_map(&target_map)?;
    repo.write_index(&mut index)?;
    repo.advance_head(theirs)?;
    Ok(MergeOutcome::FastForward(*theirs))
}

fn three_way(
    repo: &Repository,
    ours_oid: &ObjectId,
    theirs_oid: &ObjectId,
    base_oid: Option<&ObjectId>,
    target_rev: &str,
    message: Option<&str>,
) -> Result<MergeOutcome, MergeError> {
    let store = repo.store();

    let ours_commit = store.read_commit(ours_oid).map_err(RepoError::from)?;
    let theirs_commit = store.read_commit(theirs_oid).map_err(RepoError::from)?;

    let ours_map = tree_to_map(store, &ours_commit.tree)?;
    let theirs_map = tree_to_map(store, &theirs_commit.tree)?;
    let base_map: TreeMap = match base_oid {
        Some(oid) => {
            let base_commit = store.read_commit(oid).map_err(RepoError::from)?;
            tree_to_map(store, &base_commit.tree)?
        }
        // Unrelated histories merge against an empty base.
        None => TreeMap::new(),
    };

    let mut paths: BTreeSet<BString> = BTreeSet::new();
    paths.extend(base_map.keys().cloned());
    paths.extend(ours_map.keys().cloned());
    paths.extend(theirs_map.keys().cloned());

    // Resolve each path to a merged entry, a deletion, or a conflict.
    let mut merged: TreeMap = TreeMap::new();
    let mut conflict_files: Vec<(BString, Vec<u8>, Option<(ObjectId, FileMode)>)> = Vec::new();

    for path in paths {
        let b = base_map.get(&path).copied();
        let o = ours_map.get(&path).copied();
        let t = theirs_map.get(&path).copied();

        let resolution = if o == t {
            o
        } else if o == b {
            t
        } else if t == b {
            o
        } else {
            // Both sides changed the path in different ways.
            let base_content = read_opt_blob(repo, b)?;
            let ours_content = read_opt_blob(repo, o)?;
            let theirs_content = read_opt_blob(repo, t)?;

            let result = merge_content(
                base_content.as_deref().unwrap_or(b""),
                ours_content.as_deref().unwrap_or(b""),
                theirs_content.as_deref().unwrap_or(b""),
            );

            if result.is_clean() && o.is_some() && t.is_some() {
                let oid = store
                    .write(&Object::Blob(Blob::new(result.content)))
                    .map_err(RepoError::from)?;
                let mode = merged_mode(b, o, t);
                merged.insert(path.clone(), (oid, mode));
                continue;
            }

            conflict_files.push((path.clone(), result.content, b));
            continue;
        };

        if let Some(entry) = resolution {
            merged.insert(path.clone(), entry);
        }
    }

    apply_to_worktree(repo, &ours_map, &merged, &conflict_files)?;

    // Stage the merged result; conflicted paths stay at the base blob.
    let mut index = Index::new();
    for (path, (oid, mode)) in &merged {
        index.add_or_update(stage_entry(path, *oid, *mode));
    }
    for (path, _, base) in &conflict_files {
        if let Some((oid, mode)) = base {
            index.add_or_update(stage_entry(path, *oid, *mode));
        }
    }
    repo.write_index(&mut index)?;

    if !conflict_files.is_empty() {
        let conflict_paths: Vec<BString> =
            conflict_files.iter().map(|(p, _, _)| p.clone()).collect();
        repo.write_merge_state(theirs_oid, &conflict_paths)?;
        return Ok(MergeOutcome::Conflicts(conflict_paths));
    }

    let default_message = format!("Merge {target_rev}");
    repo.write_merge_state(theirs_oid, &[])?;
    let oid = repo.commit(message.unwrap_or(&default_message))?;
    Ok(MergeOutcome::Merged(oid))
}

/// Mode for a cleanly content-merged file: prefer the side that changed it.
fn merged_mode(
    base: Option<(ObjectId, FileMode)>,
    ours: Option<(ObjectId, FileMode)>,
    theirs: Option<(ObjectId, FileMode)>,
) -> FileMode {
    let base_mode = base.map(|(_, m)| m);
    match (ours, theirs) {
        (Some((_, om)), Some((_, tm))) => {
            if Some(om) == base_mode {
                tm
            } else {
                om
            }
        }
        (Some((_, m)), None) | (None, Some((_, m))) => m,
        (None, None) => FileMode::Regular,
    }
}

fn read_opt_blob(
    repo: &Repository,
    entry: Option<(ObjectId, FileMode)>,
) -> Result<Option<Vec<u8>>, RepoError> {
    match entry {
        None => Ok(None),
        Some((oid, _)) => Ok(Some(repo.store().read_blob(&oid)?.data.to_vec())),
    }
}

/// Bring the working tree from `ours` to the merged state, writing conflict
/// files with markers in place.
fn apply_to_worktree(
    repo: &Repository,
    ours_map: &TreeMap,
    merged: &TreeMap,
    conflict_files: &[(BString, Vec<u8>, Option<(ObjectId, FileMode)>)],
) -> Result<(), MergeError> {
    let work_dir = repo.require_work_dir()?.to_path_buf();

    for path in ours_map.keys() {
        let still_present =
            merged.contains_key(path) || conflict_files.iter().any(|(p, _, _)| p == path);
        if !still_present {
            let fs_path = workdir_file_path(&work_dir, path.as_bstr());
            if fs_path.is_file() {
                fs::remove_file(&fs_path).map_err(RepoError::from)?;
            }
        }
    }

    for (path, entry) in merged {
        if ours_map.get(path) != Some(entry) {
            repo.write_workdir_file(path, &entry.0, entry.1)?;
        }
    }

    for (path, content, _) in conflict_files {
        let fs_path = workdir_file_path(&work_dir, path.as_bstr());
        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent).map_err(RepoError::from)?;
        }
        fs::write(&fs_path, content).map_err(RepoError::from)?;
    }

    Ok(())
}

/// An index entry for a merge-produced blob. Stat fields are zeroed so the
/// next status re-hashes the file instead of trusting the cache.
fn stage_entry(path: &BString, oid: ObjectId, mode: FileMode) -> IndexEntry {
    IndexEntry {
        mode,
        oid,
        mtime_secs: 0,
        mtime_nanos: 0,
        size: 0,
        path: path.clone(),
    }
}
