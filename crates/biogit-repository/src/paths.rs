//! Path normalization between the filesystem and the repository model.
//!
//! Inside the repository (index, trees, wire) paths are always relative to
//! the working tree root, use forward slashes, and contain no `.` or `..`
//! components.

use std::path::{Component, Path, PathBuf};

use bstr::{BStr, BString, ByteSlice};

use crate::RepoError;

/// Normalize a user-supplied path to a repository-relative byte path.
///
/// `given` may be absolute or relative to `cwd`; the result is relative to
/// `work_dir`. Fails when the path escapes the working tree.
pub fn normalize_rel_path(
    work_dir: &Path,
    cwd: &Path,
    given: &Path,
) -> Result<BString, RepoError> {
    let absolute = if given.is_absolute() {
        given.to_path_buf()
    } else {
        cwd.join(given)
    };

    // Resolve `.` and `..` lexically.
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(RepoError::PathOutsideWorkTree(
                        given.display().to_string(),
                    ));
                }
            }
            other => resolved.push(other.as_os_str()),
        }
    }

    let rel = resolved
        .strip_prefix(work_dir)
        .map_err(|_| RepoError::PathOutsideWorkTree(given.display().to_string()))?;

    let mut out = BString::from("");
    for component in rel.components() {
        if !out.is_empty() {
            out.push(b'/');
        }
        let Some(part) = component.as_os_str().to_str() else {
            return Err(RepoError::PathOutsideWorkTree(given.display().to_string()));
        };
        out.extend_from_slice(part.as_bytes());
    }

    if out.is_empty() {
        return Err(RepoError::PathspecUnmatched(given.display().to_string()));
    }
    Ok(out)
}

/// Join a repository-relative byte path onto the working tree root.
pub fn workdir_file_path(work_dir: &Path, rel: &BStr) -> PathBuf {
    let mut out = work_dir.to_path_buf();
    for part in rel.split_str("/") {
        out.push(part.to_str_lossy().as_ref());
    }
    out
}
