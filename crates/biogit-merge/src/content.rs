//! Three-way content merge using diff change regions.
//!
//! Diffs base→ours and base→theirs, interleaves non-overlapping changes,
//! and brackets overlapping divergent regions with conflict markers.

use biogit_diff::myers::{diff_lines, split_lines, Edit, EditOp};

/// Result of merging one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMerge {
    /// The merged bytes (with markers when conflicted).
    pub content: Vec<u8>,
    /// Number of conflicted regions.
    pub conflicts: usize,
}

impl ContentMerge {
    /// Whether the merge was clean.
    pub fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

/// Merge `ours` and `theirs` against their common `base`.
pub fn merge_content(base: &[u8], ours: &[u8], theirs: &[u8]) -> ContentMerge {
    // Trivial resolutions first.
    if ours == theirs {
        return ContentMerge {
            content: ours.to_vec(),
            conflicts: 0,
        };
    }
    if base == ours {
        return ContentMerge {
            content: theirs.to_vec(),
            conflicts: 0,
        };
    }
    if base == theirs {
        return ContentMerge {
            content: ours.to_vec(),
            conflicts: 0,
        };
    }

    let base_lines = split_lines(base);
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);

    let ours_regions = change_regions(&diff_lines(&base_lines, &ours_lines));
    let theirs_regions = change_regions(&diff_lines(&base_lines, &theirs_lines));

    merge_regions(
        &base_lines,
        &ours_lines,
        &theirs_lines,
        &ours_regions,
        &theirs_regions,
    )
}

/// A contiguous run of changes relative to the base.
#[derive(Debug, Clone, Copy)]
struct ChangeRegion {
    /// Start line in base (0-indexed).
    base_start: usize,
    /// Lines removed from base.
    base_len: usize,
    /// Start line in the changed file (0-indexed).
    new_start: usize,
    /// Lines added.
    new_len: usize,
}

fn change_regions(edits: &[Edit]) -> Vec<ChangeRegion> {
    let mut regions = Vec::new();
    let mut i = 0;

    while i < edits.len() {
        if edits[i].op == EditOp::Match {
            i += 1;
            continue;
        }

        let base_start = edits[i].old_index;
        let new_start = edits[i].new_index;
        let mut base_end = base_start;
        let mut new_end = new_start;

        while i < edits.len() && edits[i].op != EditOp::Match {
            match edits[i].op {
                EditOp::Delete => base_end = edits[i].old_index + 1,
                EditOp::Insert => new_end = edits[i].new_index + 1,
                EditOp::Match => unreachable!(),
            }
            i += 1;
        }

        regions.push(ChangeRegion {
            base_start,
            base_len: base_end - base_start,
            new_start,
            new_len: new_end - new_start,
        });
    }

    regions
}

fn merge_regions(
    base_lines: &[&[u8]],
    ours_lines: &[&[u8]],
    theirs_lines: &[&[u8]],
    ours_regions: &[ChangeRegion],
    theirs_regions: &[ChangeRegion],
) -> ContentMerge {
    let mut out: Vec<u8> = Vec::new();
    let mut conflicts = 0;

    let mut base_pos = 0;
    let mut oi = 0;
    let mut ti = 0;

    while oi < ours_regions.len() || ti < theirs_regions.len() {
        match (ours_regions.get(oi), theirs_regions.get(ti)) {
            (Some(o), Some(t)) => {
                let o_end = o.base_start + o.base_len;
                let t_end = t.base_start + t.base_len;

                if o_end < t.base_start || (o_end == t.base_start && o.base_start < t.base_start) {
                    // Ours strictly first; no overlap.
                    emit_range(&mut out, base_lines, base_pos, o.base_start);
                    emit_count(&mut out, ours_lines, o.new_start, o.new_len);
                    base_pos = o_end;
                    oi += 1;
                } else if t_end < o.base_start
                    || (t_end == o.base_start && t.base_start < o.base_start)
                {
                    // Theirs strictly first; no overlap.
                    emit_range(&mut out, base_lines, base_pos, t.base_start);
                    emit_count(&mut out, theirs_lines, t.new_start, t.new_len);
                    base_pos = t_end;
                    ti += 1;
                } else {
                    // Overlap: accept identical replacements, else conflict.
                    let ours_content = collect(ours_lines, o.new_start, o.new_len);
                    let theirs_content = collect(theirs_lines, t.new_start, t.new_len);

                    let overlap_start = o.base_start.min(t.base_start);
                    let overlap_end = o_end.max(t_end);
                    emit_range(&mut out, base_lines, base_pos, overlap_start);

                    if ours_content == theirs_content {
                        out.extend_from_slice(&ours_content);
                    } else {
                        conflicts += 1;
                        emit_conflict(&mut out, &ours_content, &theirs_content);
                    }

                    base_pos = overlap_end;
                    oi += 1;
                    ti += 1;
                }
            }
            (Some(o), None) => {
                emit_range(&mut out, base_lines, base_pos, o.base_start);
                emit_count(&mut out, ours_lines, o.new_start, o.new_len);
                base_pos = o.base_start + o.base_len;
                oi += 1;
            }
            (None, Some(t)) => {
                emit_range(&mut out, base_lines, base_pos, t.base_start);
                emit_count(&mut out, theirs_lines, t.new_start, t.new_len);
                base_pos = t.base_start + t.base_len;
                ti += 1;
            }
            (None, None) => break,
        }
    }

    emit_range(&mut out, base_lines, base_pos, base_lines.len());

    ContentMerge {
        content: out,
        conflicts,
    }
}

fn emit_range(out: &mut Vec<u8>, lines: &[&[u8]], from: usize, to: usize) {
    for line in &lines[from.min(lines.len())..to.min(lines.len())] {
        out.extend_from_slice(line);
    }
}

fn emit_count(out: &mut Vec<u8>, lines: &[&[u8]], start: usize, count: usize) {
    emit_range(out, lines, start, start + count);
}

fn collect(lines: &[&[u8]], start: usize, count: usize) -> Vec<u8> {
    let mut out = Vec::new();
    emit_count(&mut out, lines, start, count);
    out
}

fn emit_conflict(out: &mut Vec<u8>, ours: &[u8], theirs: &[u8]) {
    out.extend_from_slice(b"<<<<<<< ours\n");
    out.extend_from_slice(ours);
    if !ours.is_empty() && !ours.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(b"=======\n");
    out.extend_from_slice(theirs);
    if !theirs.is_empty() && !theirs.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(b">>>>>>> theirs\n");
}
