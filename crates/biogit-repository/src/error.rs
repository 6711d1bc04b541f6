use std::path::PathBuf;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a biogit repository (or any parent): {0}")]
    NotARepository(PathBuf),

    #[error("unknown revision {0:?}")]
    UnknownRevision(String),

    #[error("pathspec {0:?} did not match any files")]
    PathspecUnmatched(String),

    #[error("path {0:?} escapes the working tree")]
    PathOutsideWorkTree(String),

    #[error("branch {0:?} already exists")]
    BranchExists(String),

    #[error("branch {0:?} not found")]
    BranchNotFound(String),

    #[error("cannot delete branch {0:?}: checked out")]
    BranchCheckedOut(String),

    #[error("branch {0:?} is not fully merged; use -D to force")]
    BranchNotMerged(String),

    #[error("tag {0:?} already exists")]
    TagExists(String),

    #[error("tag {0:?} not found")]
    TagNotFound(String),

    #[error("working directory not clean: {0:?} has local modifications")]
    WorkingDirectoryDirty(String),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("no commits yet on this branch")]
    UnbornHead,

    #[error("cannot commit: unresolved conflicts in {0:?}")]
    UnresolvedConflicts(String),

    #[error("user identity not configured; set user.name and user.email")]
    MissingIdentity,

    #[error("remote {0:?} is not configured")]
    RemoteNotConfigured(String),

    #[error(transparent)]
    Store(#[from] biogit_store::StoreError),

    #[error(transparent)]
    Index(#[from] biogit_index::IndexError),

    #[error(transparent)]
    Ref(#[from] biogit_ref::RefError),

    #[error(transparent)]
    Config(#[from] biogit_config::ConfigError),

    #[error(transparent)]
    Object(#[from] biogit_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] biogit_hash::HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<biogit_revwalk::RevWalkError> for RepoError {
    fn from(e: biogit_revwalk::RevWalkError) -> Self {
        match e {
            biogit_revwalk::RevWalkError::Store(s) => RepoError::Store(s),
        }
    }
}
