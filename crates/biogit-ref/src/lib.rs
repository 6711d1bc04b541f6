//! Reference system for biogit.
//!
//! Refs are named pointers to commits, stored as individual files under the
//! repository directory: `refs/heads/*` for branches, `refs/tags/*` for
//! tags, `refs/remotes/<remote>/*` for remote-tracking refs. `HEAD` is
//! either symbolic (`ref: refs/heads/<name>`) or detached (a bare hash).

mod name;
mod store;

pub use name::RefName;
pub use store::RefStore;

use biogit_hash::ObjectId;

/// Errors from reference operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("reference {0:?} not found")]
    NotFound(String),

    #[error("invalid reference name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("malformed reference {name:?}: {reason}")]
    Parse { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Hash(#[from] biogit_hash::HashError),
}

/// A reference — either direct (points to a commit) or symbolic (points to
/// another ref).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Direct reference to an object.
    Direct { name: RefName, target: ObjectId },
    /// Symbolic reference to another ref.
    Symbolic { name: RefName, target: RefName },
}

impl Reference {
    /// Get the ref name.
    pub fn name(&self) -> &RefName {
        match self {
            Reference::Direct { name, .. } => name,
            Reference::Symbolic { name, .. } => name,
        }
    }

    /// Is this a symbolic ref?
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Reference::Symbolic { .. })
    }

    /// Get the target OID if this is a direct ref.
    pub fn target_oid(&self) -> Option<ObjectId> {
        match self {
            Reference::Direct { target, .. } => Some(*target),
            Reference::Symbolic { .. } => None,
        }
    }

    /// Get the symbolic target if this is a symbolic ref.
    pub fn symbolic_target(&self) -> Option<&RefName> {
        match self {
            Reference::Symbolic { target, .. } => Some(target),
            Reference::Direct { .. } => None,
        }
    }
}
