//! Commit graph traversal: history walks, merge bases, and the reachability
//! closures that drive push negotiation.

mod merge_base;
mod objects;
mod walk;

pub use merge_base::{is_ancestor, merge_base};
pub use objects::{collect_objects_for_push, commits_between, tree_closure};
pub use walk::history;

/// Errors from revision walking.
#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error(transparent)]
    Store(#[from] biogit_store::StoreError),
}
