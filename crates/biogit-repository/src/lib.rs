//! Repository facade: discovery, initialization, and the porcelain-level
//! operations (staging, commits, branches, tags, switch, status, diff).
//!
//! A repository is a working tree plus a `.biogit/` directory holding the
//! object store, the index, refs, and configuration. Bare repositories
//! (servers) are the `.biogit/` layout without a working tree.

mod branch;
mod commit;
mod diff;
mod error;
mod init;
mod paths;
mod stage;
mod status;
mod switch;
mod tree_builder;
mod worktree;

pub use diff::DiffTarget;
pub use error::RepoError;
pub use init::DEFAULT_BRANCH;
pub use paths::{normalize_rel_path, workdir_file_path};
pub use status::{Status, StatusEntry, StatusKind};
pub use tree_builder::{build_tree, tree_to_map};
pub use worktree::{file_mode, hash_file, TreeMap};

use std::fs;
use std::path::{Path, PathBuf};

use bstr::BString;
use biogit_config::Config;
use biogit_hash::ObjectId;
use biogit_index::Index;
use biogit_object::Commit;
use biogit_ref::{RefName, RefStore, Reference};
use biogit_store::ObjectStore;

/// Name of the repository directory inside a working tree.
pub const BIOGIT_DIR: &str = ".biogit";

/// The central repository handle tying all subsystems together.
pub struct Repository {
    /// Path to the `.biogit` directory.
    git_dir: PathBuf,
    /// Path to the working tree (None for bare repositories).
    work_dir: Option<PathBuf>,
    /// Object store.
    store: ObjectStore,
    /// Reference store.
    refs: RefStore,
}

impl Repository {
    /// Open an existing repository whose working tree root is `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let work_dir = path.as_ref().to_path_buf();
        let git_dir = work_dir.join(BIOGIT_DIR);
        if !git_dir.join("HEAD").is_file() {
            return Err(RepoError::NotARepository(work_dir));
        }
        Ok(Self::from_dirs(git_dir, Some(work_dir)))
    }

    /// Open a bare repository: `path` IS the repository directory.
    pub fn open_bare(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let git_dir = path.as_ref().to_path_buf();
        if !git_dir.join("HEAD").is_file() {
            return Err(RepoError::NotARepository(git_dir));
        }
        Ok(Self::from_dirs(git_dir, None))
    }

    /// Discover a repository by walking up from `start`.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let start = start.as_ref();
        let mut dir = Some(start.to_path_buf());
        while let Some(d) = dir {
            if d.join(BIOGIT_DIR).join("HEAD").is_file() {
                return Self::open(&d);
            }
            dir = d.parent().map(|p| p.to_path_buf());
        }
        Err(RepoError::NotARepository(start.to_path_buf()))
    }

    fn from_dirs(git_dir: PathBuf, work_dir: Option<PathBuf>) -> Self {
        let store = ObjectStore::open(git_dir.join("objects"));
        let refs = RefStore::open(&git_dir);
        Self {
            git_dir,
            work_dir,
            store,
            refs,
        }
    }

    /// Path to the `.biogit` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Path to the working tree root, if any.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    /// Working tree root, or an error for bare repositories.
    pub fn require_work_dir(&self) -> Result<&Path, RepoError> {
        self.work_dir
            .as_deref()
            .ok_or_else(|| RepoError::NotARepository(self.git_dir.clone()))
    }

    /// The object store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// The reference store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// Load the repository configuration.
    pub fn config(&self) -> Result<Config, RepoError> {
        Ok(Config::load(self.git_dir.join("config"))?)
    }

    /// Path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    /// Load the index (empty when the file does not exist).
    pub fn load_index(&self) -> Result<Index, RepoError> {
        Ok(Index::load(&self.index_path())?)
    }

    /// Persist the index.
    pub fn write_index(&self, index: &mut Index) -> Result<(), RepoError> {
        Ok(index.write(&self.index_path())?)
    }

    /// The commit `HEAD` resolves to, or `None` on an unborn branch.
    pub fn head_commit(&self) -> Result<Option<ObjectId>, RepoError> {
        Ok(self.refs.resolve(&RefName::head())?)
    }

    /// Read the commit object `HEAD` points at.
    pub fn head_commit_object(&self) -> Result<Option<(ObjectId, Commit)>, RepoError> {
        match self.head_commit()? {
            None => Ok(None),
            Some(oid) => Ok(Some((oid, self.store.read_commit(&oid)?))),
        }
    }

    /// The author/committer identity from `user.name` / `user.email`.
    pub fn identity(&self) -> Result<biogit_object::Signature, RepoError> {
        let config = self.config()?;
        let name = config.get("user.name").map(str::to_owned);
        let email = config.get("user.email").map(str::to_owned);
        match (name, email) {
            (Some(name), Some(email)) => Ok(biogit_object::Signature::now(name, email)),
            _ => Err(RepoError::MissingIdentity),
        }
    }

    /// Resolve a revision string: `HEAD`, a branch, a tag, a full hash, or
    /// a unique hash prefix.
    pub fn resolve_revision(&self, rev: &str) -> Result<ObjectId, RepoError> {
        if rev == "HEAD" {
            return self
                .head_commit()?
                .ok_or_else(|| RepoError::UnknownRevision(rev.to_string()));
        }

        for full in [format!("refs/heads/{rev}"), format!("refs/tags/{rev}"), rev.to_string()] {
            if let Ok(name) = RefName::new(full) {
                if let Some(Reference::Direct { target, .. }) = self.refs.read(&name)? {
                    return Ok(target);
                }
            }
        }

        match self.store.resolve_prefix(rev) {
            Ok(oid) => Ok(oid),
            Err(
                biogit_store::StoreError::PrefixNotFound(_)
                | biogit_store::StoreError::PrefixTooShort(_),
            ) => Err(RepoError::UnknownRevision(rev.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// The `path -> (oid, mode)` map of the tree `HEAD` points at. Empty on
    /// an unborn branch.
    pub fn head_tree_map(
        &self,
    ) -> Result<std::collections::BTreeMap<BString, (ObjectId, biogit_object::FileMode)>, RepoError>
    {
        match self.head_commit_object()? {
            None => Ok(Default::default()),
            Some((_, commit)) => tree_to_map(&self.store, &commit.tree),
        }
    }

    // ── merge state files ──

    /// Path of `MERGE_HEAD`.
    fn merge_head_path(&self) -> PathBuf {
        self.git_dir.join("MERGE_HEAD")
    }

    /// Path of the conflicted-paths list.
    fn conflicts_path(&self) -> PathBuf {
        self.git_dir.join("BIOGIT_CONFLICTS")
    }

    /// The other side of an in-progress merge, if any.
    pub fn merge_head(&self) -> Result<Option<ObjectId>, RepoError> {
        match fs::read_to_string(self.merge_head_path()) {
            Ok(text) => Ok(Some(
                ObjectId::from_hex(text.trim()).map_err(RepoError::Hash)?,
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::Io(e)),
        }
    }

    /// Record an in-progress merge: the other head and the conflicted paths.
    pub fn write_merge_state(
        &self,
        theirs: &ObjectId,
        conflicts: &[BString],
    ) -> Result<(), RepoError> {
        fs::write(self.merge_head_path(), format!("{}\n", theirs.to_hex()))?;
        let mut body = Vec::new();
        for path in conflicts {
            body.extend_from_slice(path);
            body.push(b'\n');
        }
        fs::write(self.conflicts_path(), body)?;
        Ok(())
    }

    /// The conflicted paths of an in-progress merge.
    pub fn conflicted_paths(&self) -> Result<Vec<BString>, RepoError> {
        match fs::read(self.conflicts_path()) {
            Ok(data) => Ok(data
                .split(|&b| b == b'\n')
                .filter(|l| !l.is_empty())
                .map(BString::from)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(RepoError::Io(e)),
        }
    }

    /// Remove a path from the recorded conflict list (resolution).
    pub fn clear_conflict(&self, path: &BString) -> Result<(), RepoError> {
        let remaining: Vec<BString> = self
            .conflicted_paths()?
            .into_iter()
            .filter(|p| p != path)
            .collect();
        if remaining.is_empty() {
            let _ = fs::remove_file(self.conflicts_path());
        } else {
            let mut body = Vec::new();
            for p in &remaining {
                body.extend_from_slice(p);
                body.push(b'\n');
            }
            fs::write(self.conflicts_path(), body)?;
        }
        Ok(())
    }

    /// Drop all merge state (after the merge commit or an abort).
    pub fn clear_merge_state(&self) -> Result<(), RepoError> {
        let _ = fs::remove_file(self.merge_head_path());
        let _ = fs::remove_file(self.conflicts_path());
        Ok(())
    }

    // ── remotes ──

    /// URL of a configured remote.
    pub fn remote_url(&self, remote: &str) -> Result<String, RepoError> {
        self.config()?
            .get(&format!("remote.{remote}.url"))
            .map(str::to_owned)
            .ok_or_else(|| RepoError::RemoteNotConfigured(remote.to_string()))
    }

    /// Add a remote. Fails if it already exists.
    pub fn remote_add(&self, remote: &str, url: &str) -> Result<(), RepoError> {
        let mut config = self.config()?;
        if config.get(&format!("remote.{remote}.url")).is_some() {
            return Err(RepoError::RemoteNotConfigured(format!(
                "remote {remote} already exists"
            )));
        }
        config.set(&format!("remote.{remote}.url"), url)?;
        config.write()?;
        Ok(())
    }

    /// Remove a remote and its tracking refs.
    pub fn remote_remove(&self, remote: &str) -> Result<(), RepoError> {
        let mut config = self.config()?;
        if !config.remove_section("remote", Some(remote)) {
            return Err(RepoError::RemoteNotConfigured(remote.to_string()));
        }
        config.write()?;
        let tracking_dir = self.git_dir.join("refs/remotes").join(remote);
        if tracking_dir.is_dir() {
            fs::remove_dir_all(&tracking_dir)?;
        }
        Ok(())
    }

    /// Path of the stored session token.
    pub fn token_path(&self) -> PathBuf {
        self.git_dir.join("biogit_token")
    }

    /// Read the stored session token, if logged in.
    pub fn stored_token(&self) -> Result<Option<String>, RepoError> {
        match fs::read_to_string(self.token_path()) {
            Ok(token) => Ok(Some(token.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::Io(e)),
        }
    }

    /// Store the session token with owner-only permissions.
    pub fn store_token(&self, token: &str) -> Result<(), RepoError> {
        let path = self.token_path();
        fs::write(&path, format!("{token}\n"))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}
