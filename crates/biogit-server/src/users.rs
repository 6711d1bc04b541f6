//! File-backed user accounts.
//!
//! Accounts live in one text file under the server root, one per line:
//! `<username>:<hex sha1(salt ++ password)>:<salt>`. Mutations rewrite the
//! file atomically.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use biogit_hash::Hasher;

use crate::ServerError;

/// In-memory registry synced to the accounts file.
pub struct UserRegistry {
    path: PathBuf,
    // username -> (password hash hex, salt)
    users: HashMap<String, (String, String)>,
}

impl UserRegistry {
    /// Load the registry (missing file = no accounts yet).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref().to_path_buf();
        let mut users = HashMap::new();

        match fs::read_to_string(&path) {
            Ok(text) => {
                for line in text.lines().filter(|l| !l.is_empty()) {
                    let mut parts = line.splitn(3, ':');
                    let (Some(name), Some(hash), Some(salt)) =
                        (parts.next(), parts.next(), parts.next())
                    else {
                        return Err(ServerError::CorruptUserFile(path.clone()));
                    };
                    users.insert(name.to_string(), (hash.to_string(), salt.to_string()));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ServerError::Io(e)),
        }

        Ok(Self { path, users })
    }

    /// Create an account. Fails on duplicate usernames or names that would
    /// break the line format.
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), ServerError> {
        if username.is_empty() || username.contains(':') || username.contains('\n') {
            return Err(ServerError::InvalidUsername(username.to_string()));
        }
        if self.users.contains_key(username) {
            return Err(ServerError::UserExists(username.to_string()));
        }

        let salt = fresh_salt(username);
        let hash = hash_password(&salt, password);
        self.users.insert(username.to_string(), (hash, salt));
        self.persist()
    }

    /// Check a username/password pair.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some((hash, salt)) => hash_password(salt, password) == *hash,
            None => false,
        }
    }

    fn persist(&self) -> Result<(), ServerError> {
        let mut lines: Vec<String> = self
            .users
            .iter()
            .map(|(name, (hash, salt))| format!("{name}:{hash}:{salt}"))
            .collect();
        lines.sort();

        let tmp = self.path.with_extension("lock");
        fs::write(&tmp, lines.join("\n") + "\n")?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut input = Vec::with_capacity(salt.len() + password.len());
    input.extend_from_slice(salt.as_bytes());
    input.extend_from_slice(password.as_bytes());
    match Hasher::digest(&input) {
        Ok(oid) => oid.to_hex(),
        Err(_) => String::new(),
    }
}

/// A per-account salt derived from the clock and the username.
fn fresh_salt(username: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let seed = format!("{username}:{nanos}:{}", std::process::id());
    match Hasher::digest(seed.as_bytes()) {
        Ok(oid) => oid.to_hex()[..16].to_string(),
        Err(_) => format!("{nanos:016x}"),
    }
}
