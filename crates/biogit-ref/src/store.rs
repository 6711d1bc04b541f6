use std::fs;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use biogit_hash::ObjectId;

use crate::{RefError, RefName, Reference};

/// Files-backed reference store rooted at the repository directory.
///
/// Every ref is a small file whose body is either a 40-hex hash plus
/// newline, or (`HEAD` only) a `ref: <target>` line.
pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    /// Open the ref store for a repository directory.
    pub fn open(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.git_dir.join(name.as_str())
    }

    /// Read a ref. Returns `None` if the file does not exist.
    pub fn read(&self, name: &RefName) -> Result<Option<Reference>, RefError> {
        let path = self.ref_path(name);
        let contents = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RefError::Io(e)),
        };

        let trimmed = contents.trim();
        if let Some(target) = trimmed.strip_prefix(b"ref: ") {
            let target_str = std::str::from_utf8(target.trim()).map_err(|_| RefError::Parse {
                name: name.to_string(),
                reason: "non-UTF8 symbolic target".into(),
            })?;
            Ok(Some(Reference::Symbolic {
                name: name.clone(),
                target: RefName::new(target_str)?,
            }))
        } else {
            let hex = std::str::from_utf8(trimmed).map_err(|_| RefError::Parse {
                name: name.to_string(),
                reason: "non-UTF8 hash".into(),
            })?;
            let target = ObjectId::from_hex(hex).map_err(|_| RefError::Parse {
                name: name.to_string(),
                reason: format!("expected 40-hex hash, got {hex:?}"),
            })?;
            Ok(Some(Reference::Direct {
                name: name.clone(),
                target,
            }))
        }
    }

    /// Resolve a ref to an OID, following one level of symbolic indirection.
    ///
    /// Returns `None` when the ref (or the branch a symbolic `HEAD` points
    /// at) does not exist yet — the unborn-branch state after `init`.
    pub fn resolve(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        match self.read(name)? {
            None => Ok(None),
            Some(Reference::Direct { target, .. }) => Ok(Some(target)),
            Some(Reference::Symbolic { target, .. }) => match self.read(&target)? {
                None => Ok(None),
                Some(Reference::Direct { target, .. }) => Ok(Some(target)),
                Some(Reference::Symbolic { name, .. }) => Err(RefError::Parse {
                    name: name.to_string(),
                    reason: "nested symbolic ref".into(),
                }),
            },
        }
    }

    /// Write a direct ref (40-hex hash body).
    pub fn write_direct(&self, name: &RefName, oid: &ObjectId) -> Result<(), RefError> {
        let path = self.ref_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, format!("{}\n", oid.to_hex()).as_bytes())
    }

    /// Write a symbolic ref (`ref: <target>` body). Only `HEAD` is symbolic
    /// in practice.
    pub fn write_symbolic(&self, name: &RefName, target: &RefName) -> Result<(), RefError> {
        let path = self.ref_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, format!("ref: {target}\n").as_bytes())
    }

    /// Delete a ref. Returns whether the file existed.
    pub fn delete(&self, name: &RefName) -> Result<bool, RefError> {
        let path = self.ref_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                prune_empty_dirs(&self.git_dir, path.parent());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RefError::Io(e)),
        }
    }

    /// Read `HEAD`.
    pub fn head(&self) -> Result<Option<Reference>, RefError> {
        self.read(&RefName::head())
    }

    /// The branch `HEAD` points at, or `None` when detached or missing.
    pub fn current_branch(&self) -> Result<Option<RefName>, RefError> {
        Ok(match self.head()? {
            Some(Reference::Symbolic { target, .. }) => Some(target),
            _ => None,
        })
    }

    /// Point `HEAD` at a branch (attached).
    pub fn set_head_to_branch(&self, branch: &RefName) -> Result<(), RefError> {
        self.write_symbolic(&RefName::head(), branch)
    }

    /// Point `HEAD` directly at a commit (detached).
    pub fn set_head_detached(&self, oid: &ObjectId) -> Result<(), RefError> {
        self.write_direct(&RefName::head(), oid)
    }

    /// List all direct refs under a prefix such as `refs/heads` or `refs`,
    /// sorted by name.
    pub fn list(&self, prefix: &str) -> Result<Vec<(RefName, ObjectId)>, RefError> {
        let root = self.git_dir.join(prefix);
        let mut out = Vec::new();
        if root.is_dir() {
            collect_refs(&self.git_dir, &root, &mut out)?;
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

fn collect_refs(
    git_dir: &Path,
    dir: &Path,
    out: &mut Vec<(RefName, ObjectId)>,
) -> Result<(), RefError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_refs(git_dir, &path, out)?;
            continue;
        }
        let Ok(rel) = path.strip_prefix(git_dir) else { continue };
        let Some(rel_str) = rel.to_str() else { continue };
        let name = RefName::new(rel_str.replace('\\', "/"))?;
        let store = RefStore::open(git_dir);
        if let Some(Reference::Direct { target, .. }) = store.read(&name)? {
            out.push((name, target));
        }
    }
    Ok(())
}

/// Write a small file atomically (temp + rename).
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), RefError> {
    let tmp = path.with_extension("lock");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Remove now-empty parent directories up to (not including) `refs/`.
fn prune_empty_dirs(git_dir: &Path, start: Option<&Path>) {
    let refs_dir = git_dir.join("refs");
    let mut dir = start.map(|p| p.to_path_buf());
    while let Some(d) = dir {
        if d == refs_dir || d == *git_dir {
            break;
        }
        if d.read_dir().map(|mut e| e.next().is_none()).unwrap_or(false) {
            let _ = fs::remove_dir(&d);
            dir = d.parent().map(|p| p.to_path_buf());
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn oid(n: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        ObjectId::from_raw(bytes)
    }

    fn store() -> (TempDir, RefStore) {
        let dir = TempDir::new().unwrap();
        let store = RefStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn write_read_direct() {
        let (_dir, store) = store();
        let name = RefName::branch("main").unwrap();
        store.write_direct(&name, &oid(1)).unwrap();

        let r = store.read(&name).unwrap().unwrap();
        assert_eq!(r.target_oid(), Some(oid(1)));
    }

    #[test]
    fn ref_file_is_hex_plus_newline() {
        let (dir, store) = store();
        let name = RefName::branch("main").unwrap();
        store.write_direct(&name, &oid(1)).unwrap();

        let body = fs::read_to_string(dir.path().join("refs/heads/main")).unwrap();
        assert_eq!(body, format!("{}\n", oid(1).to_hex()));
    }

    #[test]
    fn missing_ref_is_none() {
        let (_dir, store) = store();
        assert!(store.read(&RefName::branch("none").unwrap()).unwrap().is_none());
    }

    #[test]
    fn symbolic_head_resolves_through_branch() {
        let (_dir, store) = store();
        let main = RefName::branch("main").unwrap();
        store.set_head_to_branch(&main).unwrap();

        // Unborn branch: HEAD exists but resolves to nothing.
        assert_eq!(store.resolve(&RefName::head()).unwrap(), None);
        assert_eq!(store.current_branch().unwrap(), Some(main.clone()));

        store.write_direct(&main, &oid(2)).unwrap();
        assert_eq!(store.resolve(&RefName::head()).unwrap(), Some(oid(2)));
    }

    #[test]
    fn detached_head() {
        let (_dir, store) = store();
        store.set_head_detached(&oid(3)).unwrap();
        assert_eq!(store.current_branch().unwrap(), None);
        assert_eq!(store.resolve(&RefName::head()).unwrap(), Some(oid(3)));
    }

    #[test]
    fn delete_reports_presence() {
        let (_dir, store) = store();
        let name = RefName::branch("dev").unwrap();
        store.write_direct(&name, &oid(1)).unwrap();
        assert!(store.delete(&name).unwrap());
        assert!(!store.delete(&name).unwrap());
    }

    #[test]
    fn list_sorted_by_name() {
        let (_dir, store) = store();
        store.write_direct(&RefName::branch("zeta").unwrap(), &oid(1)).unwrap();
        store.write_direct(&RefName::branch("alpha").unwrap(), &oid(2)).unwrap();
        store.write_direct(&RefName::tag("v1").unwrap(), &oid(3)).unwrap();

        let heads = store.list("refs/heads").unwrap();
        let names: Vec<_> = heads.iter().map(|(n, _)| n.short().to_string()).collect();
        assert_eq!(names, ["alpha", "zeta"]);

        let all = store.list("refs").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn nested_branch_names() {
        let (_dir, store) = store();
        let name = RefName::branch("feature/login").unwrap();
        store.write_direct(&name, &oid(1)).unwrap();
        assert_eq!(store.read(&name).unwrap().unwrap().target_oid(), Some(oid(1)));
        assert!(store.delete(&name).unwrap());
    }
}
