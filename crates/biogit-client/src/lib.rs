//! Network client: connection handling and the push/fetch/clone/pull
//! transfer sequences.
//!
//! The client speaks one request at a time over a blocking TCP connection
//! and awaits the matched response before sending the next.

mod connection;
mod transfer;

pub use connection::{Connection, RemoteUrl};
pub use transfer::{clone, fetch, pull, push, FetchResult, PushResult};

use biogit_protocol::ProtocolError;
use biogit_repository::RepoError;

/// Errors from client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid remote URL {0:?} (expected host:port/path)")]
    InvalidUrl(String),

    #[error("not logged in; run `biogit login` first")]
    NotLoggedIn,

    #[error("authentication required (token missing, invalid, or expired)")]
    AuthRequired,

    #[error("server rejected repository selection: {0}")]
    TargetRepo(String),

    #[error("ref update denied by server: {0}")]
    RefUpdateDenied(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("unexpected response: expected {expected}, got {got}")]
    Unexpected {
        expected: &'static str,
        got: String,
    },

    #[error("remote has no branch {0:?}")]
    NoSuchRemoteRef(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Merge(#[from] biogit_merge::MergeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
