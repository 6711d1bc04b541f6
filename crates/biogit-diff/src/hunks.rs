//! Grouping edit scripts into context-padded hunks.

use bstr::BString;

use crate::myers::{Edit, EditOp};

/// One line of unified diff output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(BString),
    Addition(BString),
    Deletion(BString),
}

/// A contiguous block of changes with surrounding context.
///
/// Starts are 1-based line numbers; a count of zero reports a start of zero
/// (the `-0,0` / `+0,0` forms for pure additions and deletions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

/// Convert an edit script into hunks padded with up to `context` matching
/// lines on either side. Adjacent change ranges separated by at most
/// `2 * context` matches merge into one hunk.
pub fn edits_to_hunks(
    edits: &[Edit],
    old_lines: &[&[u8]],
    new_lines: &[&[u8]],
    context: usize,
) -> Vec<Hunk> {
    // Locate runs of non-match edits as index ranges into `edits`.
    let mut change_ranges: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < edits.len() {
        if edits[i].op != EditOp::Match {
            let start = i;
            while i < edits.len() && edits[i].op != EditOp::Match {
                i += 1;
            }
            change_ranges.push((start, i));
        } else {
            i += 1;
        }
    }

    if change_ranges.is_empty() {
        return Vec::new();
    }

    // Merge ranges whose gap of matches is small enough that their context
    // windows would touch or overlap.
    let mut merged: Vec<(usize, usize)> = Vec::new();
    let mut current = change_ranges[0];
    for &(start, end) in &change_ranges[1..] {
        if start - current.1 <= 2 * context {
            current.1 = end;
        } else {
            merged.push(current);
            current = (start, end);
        }
    }
    merged.push(current);

    merged
        .into_iter()
        .map(|(start, end)| build_hunk(edits, old_lines, new_lines, start, end, context))
        .collect()
}

fn build_hunk(
    edits: &[Edit],
    old_lines: &[&[u8]],
    new_lines: &[&[u8]],
    change_start: usize,
    change_end: usize,
    context: usize,
) -> Hunk {
    let lead = change_start.saturating_sub(context);
    let trail = (change_end + context).min(edits.len());

    let mut lines = Vec::with_capacity(trail - lead);
    let mut old_count = 0;
    let mut new_count = 0;
    let mut first_old: Option<usize> = None;
    let mut first_new: Option<usize> = None;

    for edit in &edits[lead..trail] {
        match edit.op {
            EditOp::Match => {
                lines.push(DiffLine::Context(BString::from(old_lines[edit.old_index])));
                first_old.get_or_insert(edit.old_index);
                first_new.get_or_insert(edit.new_index);
                old_count += 1;
                new_count += 1;
            }
            EditOp::Delete => {
                lines.push(DiffLine::Deletion(BString::from(old_lines[edit.old_index])));
                first_old.get_or_insert(edit.old_index);
                old_count += 1;
            }
            EditOp::Insert => {
                lines.push(DiffLine::Addition(BString::from(new_lines[edit.new_index])));
                first_new.get_or_insert(edit.new_index);
                new_count += 1;
            }
        }
    }

    Hunk {
        old_start: if old_count == 0 { 0 } else { first_old.unwrap_or(0) + 1 },
        old_count,
        new_start: if new_count == 0 { 0 } else { first_new.unwrap_or(0) + 1 },
        new_count,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::myers::{diff_lines, split_lines};

    fn hunks_for(old: &[u8], new: &[u8], context: usize) -> Vec<Hunk> {
        let old_lines = split_lines(old);
        let new_lines = split_lines(new);
        let edits = diff_lines(&old_lines, &new_lines);
        edits_to_hunks(&edits, &old_lines, &new_lines, context)
    }

    #[test]
    fn context_is_limited() {
        let old = b"1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let new = b"1\n2\n3\n4\nX\n6\n7\n8\n9\n";
        let hunks = hunks_for(old, new, 2);
        assert_eq!(hunks.len(), 1);
        // 2 context + 1 del + 1 add + 2 context
        assert_eq!(hunks[0].lines.len(), 6);
        assert_eq!(hunks[0].old_start, 3);
        assert_eq!(hunks[0].old_count, 5);
    }

    #[test]
    fn nearby_changes_merge() {
        let old = b"1\n2\n3\n4\n5\n6\n7\n";
        let new = b"X\n2\n3\n4\n5\n6\nY\n";
        // Gap of 5 matches <= 2 * 3 context: one hunk.
        let hunks = hunks_for(old, new, 3);
        assert_eq!(hunks.len(), 1);
    }

    #[test]
    fn distant_changes_split() {
        let old = b"1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";
        let new = b"X\n2\n3\n4\n5\n6\n7\n8\n9\nY\n";
        // Gap of 8 matches > 2 * 1 context: two hunks.
        let hunks = hunks_for(old, new, 1);
        assert_eq!(hunks.len(), 2);
    }

    #[test]
    fn new_file_reports_zero_old_range() {
        let hunks = hunks_for(b"", b"a\nb\n", 3);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 0);
        assert_eq!(hunks[0].old_count, 0);
        assert_eq!(hunks[0].new_start, 1);
        assert_eq!(hunks[0].new_count, 2);
    }

    #[test]
    fn deleted_file_reports_zero_new_range() {
        let hunks = hunks_for(b"a\nb\n", b"", 3);
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(hunks[0].old_count, 2);
        assert_eq!(hunks[0].new_start, 0);
        assert_eq!(hunks[0].new_count, 0);
    }
}
