//! Myers shortest-edit-script computation.
//!
//! Implements Eugene Myers' O((M+N)·D) difference algorithm (1986) over
//! line sequences, with common prefix/suffix trimming before the core
//! search.

/// An edit operation in the edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Line present in both sequences.
    Match,
    /// Line inserted (present only in new).
    Insert,
    /// Line deleted (present only in old).
    Delete,
}

/// A single edit, referencing lines by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    /// The operation.
    pub op: EditOp,
    /// Index into the old sequence (meaningful for Match and Delete).
    pub old_index: usize,
    /// Index into the new sequence (meaningful for Match and Insert).
    pub new_index: usize,
}

/// Split a buffer into lines, each retaining its trailing newline.
pub fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in data.iter().enumerate() {
        if b == b'\n' {
            lines.push(&data[start..=i]);
            start = i + 1;
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

/// Compute a shortest edit script from `old` to `new`.
pub fn diff_lines(old: &[&[u8]], new: &[&[u8]]) -> Vec<Edit> {
    // Trim the common prefix.
    let prefix_len = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Trim the common suffix of what remains.
    let suffix_len = old[prefix_len..]
        .iter()
        .rev()
        .zip(new[prefix_len..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix_len..old.len() - suffix_len];
    let new_mid = &new[prefix_len..new.len() - suffix_len];

    let mut edits = Vec::with_capacity(old.len().max(new.len()));

    for i in 0..prefix_len {
        edits.push(Edit {
            op: EditOp::Match,
            old_index: i,
            new_index: i,
        });
    }

    for edit in myers_core(old_mid, new_mid) {
        edits.push(Edit {
            op: edit.op,
            old_index: edit.old_index + prefix_len,
            new_index: edit.new_index + prefix_len,
        });
    }

    for i in 0..suffix_len {
        edits.push(Edit {
            op: EditOp::Match,
            old_index: old.len() - suffix_len + i,
            new_index: new.len() - suffix_len + i,
        });
    }

    edits
}

/// Core greedy forward search on the trimmed sequences.
///
/// Records the furthest-reaching V array per D round so the edit path can
/// be reconstructed by backtracking.
fn myers_core(old: &[&[u8]], new: &[&[u8]]) -> Vec<Edit> {
    let n = old.len();
    let m = new.len();

    if n == 0 {
        return (0..m)
            .map(|j| Edit {
                op: EditOp::Insert,
                old_index: 0,
                new_index: j,
            })
            .collect();
    }
    if m == 0 {
        return (0..n)
            .map(|i| Edit {
                op: EditOp::Delete,
                old_index: i,
                new_index: 0,
            })
            .collect();
    }

    let max_d = n + m;
    let offset = max_d as isize;
    let mut v = vec![0usize; 2 * max_d + 1];
    let mut trace: Vec<Vec<usize>> = Vec::new();

    'search: for d in 0..=max_d {
        let mut k = -(d as isize);
        while k <= d as isize {
            let down = k == -(d as isize)
                || (k != d as isize && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize]);
            let mut x = if down {
                v[(k + 1 + offset) as usize]
            } else {
                v[(k - 1 + offset) as usize] + 1
            };
            let mut y = (x as isize - k) as usize;

            // Follow the diagonal.
            while x < n && y < m && old[x] == new[y] {
                x += 1;
                y += 1;
            }

            v[(k + offset) as usize] = x;

            if x >= n && y >= m {
                trace.push(v.clone());
                break 'search;
            }
            k += 2;
        }
        trace.push(v.clone());
    }

    backtrack(&trace, n, m, offset)
}

/// Walk the trace backwards from (n, m) to (0, 0), emitting edits.
fn backtrack(trace: &[Vec<usize>], n: usize, m: usize, offset: isize) -> Vec<Edit> {
    let mut edits = Vec::new();
    let mut x = n;
    let mut y = m;

    for d in (0..trace.len()).rev() {
        let k = x as isize - y as isize;

        let prev_k = if d == 0 {
            k
        } else if k == -(d as isize)
            || (k != d as isize
                && trace[d - 1][(k - 1 + offset) as usize] < trace[d - 1][(k + 1 + offset) as usize])
        {
            k + 1 // came from an insert
        } else {
            k - 1 // came from a delete
        };

        let prev_x = if d == 0 {
            0
        } else {
            trace[d - 1][(prev_k + offset) as usize]
        };
        let prev_y = (prev_x as isize - prev_k) as usize;

        // The diagonal run (matches), emitted in reverse.
        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
            edits.push(Edit {
                op: EditOp::Match,
                old_index: x,
                new_index: y,
            });
        }

        if d > 0 {
            if prev_k == k + 1 {
                y -= 1;
                edits.push(Edit {
                    op: EditOp::Insert,
                    old_index: x,
                    new_index: y,
                });
            } else {
                x -= 1;
                edits.push(Edit {
                    op: EditOp::Delete,
                    old_index: x,
                    new_index: y,
                });
            }
        }
    }

    edits.reverse();
    edits
}
