//! Line diff engine: Myers edit scripts, hunk assembly, unified output.

mod hunks;
pub mod myers;
mod unified;

pub use hunks::{edits_to_hunks, DiffLine, Hunk};
pub use myers::{diff_lines, split_lines, Edit, EditOp};
pub use unified::{format_patch, FilePatch};

/// Default number of context lines around a change.
pub const DEFAULT_CONTEXT: usize = 3;

/// Diff two byte buffers into hunks ready for unified output.
pub fn diff_buffers(old: &[u8], new: &[u8], context: usize) -> Vec<Hunk> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let edits = diff_lines(&old_lines, &new_lines);
    edits_to_hunks(&edits, &old_lines, &new_lines, context)
}
