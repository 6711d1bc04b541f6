//! The biogit remote server.
//!
//! A TCP listener accepts connections and hands each to an asynchronous
//! session task; the tokio multi-thread runtime multiplexes many sessions
//! per worker. Per-session state needs no locking — each session is driven
//! by exactly one task. The user registry is the only shared mutable state
//! and sits behind a mutex; the token signer is immutable.

mod session;
mod users;

pub use session::Session;
pub use users::UserRegistry;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tracing::{info, warn};

use biogit_protocol::TokenSigner;

/// Errors from server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("corrupt user file at {0}")]
    CorruptUserFile(PathBuf),

    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    #[error("user {0:?} already exists")]
    UserExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Server configuration.
pub struct ServerConfig {
    /// Directory containing the served repositories.
    pub root: PathBuf,
    /// Secret for token signing.
    pub secret: String,
    /// Token lifetime in seconds.
    pub token_lifetime_secs: u64,
}

/// State shared by every session.
pub struct Shared {
    pub root: PathBuf,
    pub signer: TokenSigner,
    pub users: Mutex<UserRegistry>,
}

/// The listening server.
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl Server {
    /// Bind to an address and prepare the shared state.
    pub async fn bind(addr: &str, config: ServerConfig) -> Result<Self, ServerError> {
        std::fs::create_dir_all(&config.root)?;
        let users = UserRegistry::load(config.root.join("biogit_users"))?;
        let listener = TcpListener::bind(addr).await?;

        let shared = Arc::new(Shared {
            root: config.root,
            signer: TokenSigner::new(config.secret).with_lifetime(config.token_lifetime_secs),
            users: Mutex::new(users),
        });

        Ok(Self { listener, shared })
    }

    /// The bound local address (useful when binding port 0).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one session task per connection.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(root = %self.shared.root.display(), "serving repositories");
        loop {
            let (socket, peer) = self.listener.accept().await?;
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                info!(%peer, "connection open");
                if let Err(e) = Session::new(shared).run(socket).await {
                    warn!(%peer, error = %e, "session ended with error");
                }
                info!(%peer, "connection closed");
            });
        }
    }
}

/// Validate a client-supplied repository path and resolve it under `root`.
///
/// The path must be relative, slash-separated, and free of `.`/`..`
/// components; anything else is rejected before touching the filesystem.
pub fn resolve_repo_path(root: &Path, repo_path: &str) -> Option<PathBuf> {
    if repo_path.is_empty() || repo_path.len() > 512 {
        return None;
    }
    let mut out = root.to_path_buf();
    for part in repo_path.split('/') {
        if part.is_empty()
            || part == "."
            || part == ".."
            || part.contains('\\')
            || part.contains(':')
            || part.bytes().any(|b| b < 0x20)
        {
            return None;
        }
        out.push(part);
    }
    Some(out)
}
