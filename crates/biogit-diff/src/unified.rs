//! Unified diff rendering.

use bstr::{BString, ByteSlice};

use crate::hunks::{DiffLine, Hunk};

/// A file-level diff ready for rendering.
///
/// `old_path`/`new_path` of `None` mark creation and deletion respectively.
#[derive(Debug, Clone)]
pub struct FilePatch {
    pub old_path: Option<BString>,
    pub new_path: Option<BString>,
    pub hunks: Vec<Hunk>,
}

/// Render file patches in unified format.
pub fn format_patch(patches: &[FilePatch]) -> String {
    let mut out = String::new();
    for patch in patches {
        format_file(&mut out, patch);
    }
    out
}

fn format_file(out: &mut String, patch: &FilePatch) {
    if patch.hunks.is_empty() {
        return;
    }

    let display = patch
        .new_path
        .as_ref()
        .or(patch.old_path.as_ref())
        .map(|p| p.to_str_lossy().into_owned())
        .unwrap_or_default();

    out.push_str(&format!("diff --biogit a/{display} b/{display}\n"));

    match &patch.old_path {
        Some(p) => out.push_str(&format!("--- a/{}\n", p.to_str_lossy())),
        None => out.push_str("--- /dev/null\n"),
    }
    match &patch.new_path {
        Some(p) => out.push_str(&format!("+++ b/{}\n", p.to_str_lossy())),
        None => out.push_str("+++ /dev/null\n"),
    }

    for hunk in &patch.hunks {
        format_hunk(out, hunk);
    }
}

fn format_hunk(out: &mut String, hunk: &Hunk) {
    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
    ));

    for line in &hunk.lines {
        let (marker, content) = match line {
            DiffLine::Context(c) => (' ', c),
            DiffLine::Addition(c) => ('+', c),
            DiffLine::Deletion(c) => ('-', c),
        };
        out.push(marker);
        out.push_str(&content.to_str_lossy());
        if !content.ends_with(b"\n") {
            out.push_str("\n\\ No newline at end of file\n");
        }
    }
}
