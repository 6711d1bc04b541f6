//! Transfer sequencing: push, fetch, clone, pull.

use std::collections::HashSet;
use std::path::Path;

use biogit_hash::ObjectId;
use biogit_merge::MergeOutcome;
use biogit_protocol::{Message, RefValue};
use biogit_ref::RefName;
use biogit_repository::{RepoError, Repository};
use biogit_revwalk::{collect_objects_for_push, commits_between};

use crate::connection::{unexpected, Connection, RemoteUrl};
use crate::ClientError;

/// What a push accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResult {
    /// Objects the server did not have and received.
    pub objects_sent: usize,
    /// The remote ref's new value.
    pub new_tip: ObjectId,
}

/// What a fetch brought in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Objects downloaded.
    pub objects_received: usize,
    /// Remote-tracking refs updated: `(branch, tip)`.
    pub updated: Vec<(String, ObjectId)>,
    /// The branch the remote `HEAD` points at, when advertised.
    pub remote_default_branch: Option<String>,
}

/// Open a connection bound to the repository behind `remote`, using the
/// stored token.
fn open_session(repo: &Repository, remote: &str) -> Result<(Connection, String), ClientError> {
    let url = RemoteUrl::parse(&repo.remote_url(remote)?)?;
    let token = repo.stored_token()?.ok_or(ClientError::NotLoggedIn)?;

    let mut connection = Connection::connect(&url.addr())?;
    connection.target_repo(&token, &url.repo_path)?;
    Ok((connection, token))
}

/// Push `branch` to `remote`.
///
/// Negotiates the object delta via `check-objects`, uploads what is
/// missing, then updates the remote ref with a compare-and-set on its old
/// value (unless `force`).
pub fn push(
    repo: &Repository,
    remote: &str,
    branch: &str,
    force: bool,
) -> Result<PushResult, ClientError> {
    let local_ref = RefName::branch(branch).map_err(RepoError::from)?;
    let local_tip = repo
        .refs()
        .resolve(&local_ref)
        .map_err(RepoError::from)?
        .ok_or_else(|| RepoError::BranchNotFound(branch.to_string()))?;

    let (mut connection, token) = open_session(repo, remote)?;

    // Learn the remote's current value for the ref.
    let remote_refs = connection.list_refs(&token)?;
    let remote_tip = remote_refs.iter().find_map(|(name, value)| match value {
        RefValue::Direct(oid) if name == local_ref.as_str() => Some(*oid),
        _ => None,
    });

    // Everything the remote might be missing.
    let commits = commits_between(repo.store(), &local_tip, remote_tip.as_ref())
        .map_err(RepoError::from)?;
    let candidates = collect_objects_for_push(repo.store(), &commits).map_err(RepoError::from)?;

    // Ask which of those the server already has.
    let missing: Vec<ObjectId> = if candidates.is_empty() {
        Vec::new()
    } else {
        let response = connection.request(&Message::CheckObjects {
            token: token.clone(),
            oids: candidates.clone(),
        })?;
        let present = match response {
            Message::CheckObjectsResult(present) => present,
            other => return Err(unexpected("CHECK_OBJECTS_RESULT", other)),
        };
        candidates
            .into_iter()
            .zip(present)
            .filter_map(|(oid, have)| (!have).then_some(oid))
            .collect()
    };

    // Upload the gap, one object per request.
    for oid in &missing {
        let data = repo.store().read_serialized(oid).map_err(RepoError::from)?;
        let response = connection.request(&Message::PutObject {
            token: token.clone(),
            oid: *oid,
            data,
        })?;
        if !matches!(response, Message::AckOk) {
            return Err(unexpected("ACK_OK", response));
        }
    }

    let response = connection.request(&Message::UpdateRef {
        token,
        force,
        name: local_ref.as_str().to_string(),
        new: local_tip,
        expected_old: remote_tip,
    })?;
    match response {
        Message::RefUpdated => Ok(PushResult {
            objects_sent: missing.len(),
            new_tip: local_tip,
        }),
        Message::RefUpdateDenied(reason) => Err(ClientError::RefUpdateDenied(reason)),
        other => Err(unexpected("REF_UPDATED", other)),
    }
}

/// Fetch from `remote`, updating `refs/remotes/<remote>/<branch>` for every
/// advertised branch (or just `only_branch`).
pub fn fetch(
    repo: &Repository,
    remote: &str,
    only_branch: Option<&str>,
) -> Result<FetchResult, ClientError> {
    let (mut connection, token) = open_session(repo, remote)?;
    let remote_refs = connection.list_refs(&token)?;

    let mut remote_default_branch = None;
    let mut targets: Vec<(String, ObjectId)> = Vec::new();
    for (name, value) in &remote_refs {
        match value {
            RefValue::Symbolic(target) if name == "HEAD" => {
                remote_default_branch = target
                    .strip_prefix("refs/heads/")
                    .map(|branch| branch.to_string());
            }
            RefValue::Direct(oid) => {
                if let Some(branch) = name.strip_prefix("refs/heads/") {
                    if only_branch.map_or(true, |only| only == branch) {
                        targets.push((branch.to_string(), *oid));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(only) = only_branch {
        if targets.is_empty() {
            return Err(ClientError::NoSuchRemoteRef(only.to_string()));
        }
    }

    // Download every missing object reachable from the wanted tips using a
    // work queue seeded from commit parents and tree entries.
    let mut received = 0usize;
    let mut queued: HashSet<ObjectId> = HashSet::new();
    let mut queue: Vec<ObjectId> = Vec::new();
    for (_, tip) in &targets {
        if queued.insert(*tip) {
            queue.push(*tip);
        }
    }

    while let Some(oid) = queue.pop() {
        if repo.store().contains(&oid) {
            continue;
        }
        let response = connection.request(&Message::GetObject {
            token: token.clone(),
            oid,
        })?;
        let data = match response {
            Message::ObjectContent { oid: got, data } if got == oid => data,
            Message::ObjectNotFound(missing) => {
                return Err(ClientError::Server(format!(
                    "remote advertises {missing} but cannot serve it"
                )));
            }
            other => return Err(unexpected("OBJECT_CONTENT", other)),
        };
        repo.store()
            .write_serialized(&oid, &data)
            .map_err(RepoError::from)?;
        received += 1;

        for referenced in references_of(repo, &oid)? {
            if queued.insert(referenced) {
                queue.push(referenced);
            }
        }
    }

    // Point the tracking refs at the fetched tips.
    let mut updated = Vec::new();
    for (branch, tip) in targets {
        let tracking = RefName::remote(remote, &branch).map_err(RepoError::from)?;
        repo.refs()
            .write_direct(&tracking, &tip)
            .map_err(RepoError::from)?;
        updated.push((branch, tip));
    }

    Ok(FetchResult {
        objects_received: received,
        updated,
        remote_default_branch,
    })
}

/// Objects directly referenced by a just-fetched object.
fn references_of(repo: &Repository, oid: &ObjectId) -> Result<Vec<ObjectId>, ClientError> {
    use biogit_object::Object;
    let mut out = Vec::new();
    match repo.store().read(oid).map_err(RepoError::from)? {
        Object::Commit(commit) => {
            out.push(commit.tree);
            out.extend(commit.parents);
        }
        Object::Tree(tree) => out.extend(tree.iter().map(|e| e.oid)),
        Object::Blob(_) => {}
    }
    Ok(out)
}

/// Clone `url` into `target_dir`: init, configure `origin`, fetch, then
/// check out the server's default branch.
pub fn clone(url: &str, target_dir: &Path, token: &str) -> Result<Repository, ClientError> {
    RemoteUrl::parse(url)?; // validate before touching disk

    let repo = Repository::init(target_dir)?;
    repo.remote_add("origin", url)?;
    repo.store_token(token)?;

    let result = fetch(&repo, "origin", None)?;

    // The server's HEAD names the branch to check out; fall back to the
    // first fetched branch for servers with a detached or unborn HEAD.
    let branch = result
        .remote_default_branch
        .clone()
        .or_else(|| result.updated.first().map(|(b, _)| b.clone()));

    if let Some(branch) = branch {
        if let Some((_, tip)) = result.updated.iter().find(|(b, _)| *b == branch) {
            let local = RefName::branch(&branch).map_err(RepoError::from)?;
            repo.refs()
                .write_direct(&local, tip)
                .map_err(RepoError::from)?;
            repo.refs()
                .set_head_to_branch(&local)
                .map_err(RepoError::from)?;

            let commit = repo.store().read_commit(tip).map_err(RepoError::from)?;
            let map = repo.checkout_tree(&commit.tree, &Default::default())?;
            let mut index = repo.index_from_map(&map)?;
            repo.write_index(&mut index)?;
        }
    }

    Ok(repo)
}

/// Pull: fetch `branch` from `remote`, then merge the tracking ref into the
/// current branch.
pub fn pull(repo: &Repository, remote: &str, branch: &str) -> Result<MergeOutcome, ClientError> {
    fetch(repo, remote, Some(branch))?;
    let tracking = format!("refs/remotes/{remote}/{branch}");
    Ok(biogit_merge::merge(repo, &tracking, None)?)
}
