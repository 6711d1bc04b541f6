use std::fs;
use std::path::Path;

use crate::{RepoError, Repository, BIOGIT_DIR};

/// Default branch name for new repositories.
pub const DEFAULT_BRANCH: &str = "main";

impl Repository {
    /// Initialize a repository with a working tree at `path`.
    ///
    /// Re-running init on an existing repository is a safe no-op.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let work_dir = path.as_ref().to_path_buf();
        let git_dir = work_dir.join(BIOGIT_DIR);
        init_layout(&git_dir)?;
        Self::open(&work_dir)
    }

    /// Initialize a bare repository: `path` becomes the repository directory.
    pub fn init_bare(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let git_dir = path.as_ref().to_path_buf();
        init_layout(&git_dir)?;
        Self::open_bare(&git_dir)
    }
}

/// Create the standard repository structure:
/// - `HEAD` (pointing at the default branch)
/// - `config`
/// - `objects/`
/// - `refs/heads/`, `refs/tags/`, `refs/remotes/`
fn init_layout(git_dir: &Path) -> Result<(), RepoError> {
    // Existing repository: do not overwrite anything.
    if git_dir.join("HEAD").is_file() {
        return Ok(());
    }

    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    fs::create_dir_all(git_dir.join("refs").join("tags"))?;
    fs::create_dir_all(git_dir.join("refs").join("remotes"))?;

    fs::write(
        git_dir.join("HEAD"),
        format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
    )?;
    fs::write(git_dir.join("config"), "")?;

    Ok(())
}
