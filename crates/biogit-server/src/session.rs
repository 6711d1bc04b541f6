//! Per-connection protocol session.
//!
//! Each session is one task: read a frame, dispatch, queue the responses,
//! write them out, repeat. The 6-byte header is staged with `read_exact`,
//! which absorbs partial reads from the socket; the body buffer is only
//! allocated once the header (and its length cap) has been validated.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use biogit_hash::ObjectId;
use biogit_protocol::{Message, RawFrame, RefValue, FRAME_HEADER_LEN};
use biogit_ref::{RefName, Reference};
use biogit_repository::Repository;
use biogit_revwalk::is_ancestor;
use biogit_store::StoreError;

use crate::{resolve_repo_path, ServerError, Shared};

/// Authentication failures tolerated before the connection is dropped.
const MAX_AUTH_FAILURES: u32 = 3;

/// Session authentication / binding state.
enum State {
    Unauthenticated,
    Authenticated,
    RepoBound(Repository),
}

impl State {
    fn repo(&self) -> Option<&Repository> {
        match self {
            State::RepoBound(repo) => Some(repo),
            _ => None,
        }
    }
}

/// Why a session stops.
enum Outcome {
    /// Keep serving requests.
    Continue,
    /// Protocol violation or repeated auth failure: close after flushing.
    Close,
}

/// One client connection's state machine.
pub struct Session {
    shared: Arc<Shared>,
    state: State,
    auth_failures: u32,
}

impl Session {
    pub fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            state: State::Unauthenticated,
            auth_failures: 0,
        }
    }

    /// Serve the connection until the peer disconnects or a fatal protocol
    /// error occurs.
    pub async fn run(mut self, mut socket: TcpStream) -> Result<(), ServerError> {
        let mut header = [0u8; FRAME_HEADER_LEN];

        loop {
            match socket.read_exact(&mut header).await {
                Ok(_) => {}
                // Peer hung up between requests: a normal close.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            }

            let (id, len) = match RawFrame::parse_header(&header) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "malformed frame header, closing");
                    return Ok(());
                }
            };

            let mut body = vec![0u8; len as usize];
            socket.read_exact(&mut body).await?;

            let message = match Message::decode(&RawFrame { id, body }) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "undecodable message, closing");
                    return Ok(());
                }
            };

            debug!(id = ?message.id(), "dispatch");
            let (responses, outcome) = self.handle(message);
            for response in &responses {
                socket.write_all(&response.encode().encode()).await?;
            }
            socket.flush().await?;

            if matches!(outcome, Outcome::Close) {
                return Ok(());
            }
        }
    }

    /// Dispatch one request to its handler.
    fn handle(&mut self, message: Message) -> (Vec<Message>, Outcome) {
        // Stateless token validation guards every authenticated request.
        if message.id().requires_token() {
            let token = match &message {
                Message::TargetRepo { token, .. }
                | Message::ListRefs { token }
                | Message::GetObject { token, .. }
                | Message::CheckObjects { token, .. }
                | Message::PutObject { token, .. }
                | Message::UpdateRef { token, .. } => token.clone(),
                _ => String::new(),
            };
            if self.shared.signer.validate(&token).is_err() {
                self.auth_failures += 1;
                let outcome = if self.auth_failures >= MAX_AUTH_FAILURES {
                    warn!("repeated auth failures, closing");
                    Outcome::Close
                } else {
                    Outcome::Continue
                };
                return (vec![Message::AuthRequired], outcome);
            }
            if matches!(self.state, State::Unauthenticated) {
                self.state = State::Authenticated;
            }
        }

        let responses = match message {
            Message::RegisterUser { username, password } => self.register(&username, &password),
            Message::LoginUser { username, password } => self.login(&username, &password),
            Message::TargetRepo { path, .. } => self.target_repo(&path),
            Message::ListRefs { .. } => self.with_repo(list_refs),
            Message::GetObject { oid, .. } => self.with_repo(|repo| get_object(repo, &oid)),
            Message::CheckObjects { oids, .. } => {
                self.with_repo(|repo| check_objects(repo, &oids))
            }
            Message::PutObject { oid, data, .. } => {
                self.with_repo(|repo| put_object(repo, &oid, &data))
            }
            Message::UpdateRef {
                force,
                name,
                new,
                expected_old,
                ..
            } => self.with_repo(|repo| update_ref(repo, force, &name, &new, expected_old)),
            // A response id arriving as a request is a protocol violation.
            other => {
                warn!(id = ?other.id(), "response-range message from client, closing");
                return (vec![Message::Error("unexpected message".into())], Outcome::Close);
            }
        };

        (responses, Outcome::Continue)
    }

    fn register(&mut self, username: &str, password: &str) -> Vec<Message> {
        if matches!(self.state, State::RepoBound(_)) {
            return vec![Message::Error(
                "account operations are not allowed on a bound session".into(),
            )];
        }
        let result = {
            let mut users = match self.shared.users.lock() {
                Ok(users) => users,
                Err(_) => return vec![Message::Error("user registry unavailable".into())],
            };
            users.register(username, password)
        };
        match result {
            Ok(()) => vec![Message::RegisterOk],
            Err(e) => vec![Message::Error(e.to_string())],
        }
    }

    fn login(&mut self, username: &str, password: &str) -> Vec<Message> {
        if matches!(self.state, State::RepoBound(_)) {
            return vec![Message::Error(
                "account operations are not allowed on a bound session".into(),
            )];
        }
        let verified = match self.shared.users.lock() {
            Ok(users) => users.verify(username, password),
            Err(_) => false,
        };
        if !verified {
            warn!(username, "login rejected");
            return vec![Message::Error("invalid credentials".into())];
        }
        self.state = State::Authenticated;
        vec![Message::LoginOk(self.shared.signer.issue(username))]
    }

    fn target_repo(&mut self, path: &str) -> Vec<Message> {
        let Some(repo_dir) = resolve_repo_path(&self.shared.root, path) else {
            return vec![Message::TargetRepoError(format!("invalid path {path:?}"))];
        };

        // First push to a new name creates the repository.
        let repo = if repo_dir.join("HEAD").is_file() {
            Repository::open_bare(&repo_dir)
        } else {
            Repository::init_bare(&repo_dir)
        };

        match repo {
            Ok(repo) => {
                self.state = State::RepoBound(repo);
                vec![Message::TargetRepoAck]
            }
            Err(e) => vec![Message::TargetRepoError(e.to_string())],
        }
    }

    fn with_repo(&mut self, f: impl FnOnce(&Repository) -> Vec<Message>) -> Vec<Message> {
        match self.state.repo() {
            Some(repo) => f(repo),
            None => vec![Message::Error("no repository selected".into())],
        }
    }
}

fn list_refs(repo: &Repository) -> Vec<Message> {
    let mut out = vec![Message::RefsListBegin];

    match repo.refs().head() {
        Ok(Some(Reference::Symbolic { target, .. })) => out.push(Message::RefsEntry {
            name: "HEAD".into(),
            value: RefValue::Symbolic(target.as_str().to_string()),
        }),
        Ok(Some(Reference::Direct { target, .. })) => out.push(Message::RefsEntry {
            name: "HEAD".into(),
            value: RefValue::Direct(target),
        }),
        Ok(None) | Err(_) => {}
    }

    match repo.refs().list("refs") {
        Ok(refs) => {
            for (name, oid) in refs {
                out.push(Message::RefsEntry {
                    name: name.as_str().to_string(),
                    value: RefValue::Direct(oid),
                });
            }
        }
        Err(e) => return vec![Message::Error(e.to_string())],
    }

    out.push(Message::RefsListEnd);
    out
}

fn get_object(repo: &Repository, oid: &ObjectId) -> Vec<Message> {
    match repo.store().read_serialized(oid) {
        Ok(data) => vec![Message::ObjectContent { oid: *oid, data }],
        Err(StoreError::NotFound(_)) => vec![Message::ObjectNotFound(*oid)],
        Err(e) => vec![Message::Error(e.to_string())],
    }
}

fn check_objects(repo: &Repository, oids: &[ObjectId]) -> Vec<Message> {
    let present = oids.iter().map(|oid| repo.store().contains(oid)).collect();
    vec![Message::CheckObjectsResult(present)]
}

fn put_object(repo: &Repository, oid: &ObjectId, data: &[u8]) -> Vec<Message> {
    match repo.store().write_serialized(oid, data) {
        Ok(_) => vec![Message::AckOk],
        // Hash mismatch and header corruption are client bugs, not ours.
        Err(e) => vec![Message::Error(e.to_string())],
    }
}

fn update_ref(
    repo: &Repository,
    force: bool,
    name: &str,
    new: &ObjectId,
    expected_old: Option<ObjectId>,
) -> Vec<Message> {
    if !name.starts_with("refs/") {
        return vec![Message::Error(format!("refusing to update {name:?}"))];
    }
    let ref_name = match RefName::new(name) {
        Ok(name) => name,
        Err(e) => return vec![Message::Error(e.to_string())],
    };

    if !repo.store().contains(new) {
        return vec![Message::RefUpdateDenied(format!(
            "target object {new} not present on server"
        ))];
    }

    let current = match repo.refs().read(&ref_name) {
        Ok(reference) => reference.and_then(|r| r.target_oid()),
        Err(e) => return vec![Message::Error(e.to_string())],
    };

    // Compare-and-set: the sole consistency anchor under concurrent pushes.
    if let Some(expected) = expected_old {
        if current != Some(expected) {
            return vec![Message::RefUpdateDenied(
                "expected old value does not match".into(),
            )];
        }
    }

    if !force {
        if let Some(current) = current {
            match is_ancestor(repo.store(), &current, new) {
                Ok(true) => {}
                Ok(false) => {
                    return vec![Message::RefUpdateDenied("not fast-forward".into())];
                }
                Err(e) => return vec![Message::Error(e.to_string())],
            }
        }
    }

    match repo.refs().write_direct(&ref_name, new) {
        Ok(()) => vec![Message::RefUpdated],
        Err(e) => vec![Message::Error(e.to_string())],
    }
}
