//! Shared test harness for biogit CLI integration tests.
//!
//! Provides a process runner and repo setup helpers used by the test
//! files. Identity is pinned through repository config for deterministic
//! commits.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn assert_ok(&self) -> &Self {
        assert_eq!(
            self.exit_code, 0,
            "command failed\nstdout: {}\nstderr: {}",
            self.stdout, self.stderr
        );
        self
    }

    pub fn assert_fails(&self) -> &Self {
        assert_ne!(self.exit_code, 0, "command unexpectedly succeeded\nstdout: {}", self.stdout);
        self
    }
}

/// Discover the path to the compiled `biogit` binary.
pub fn biogit_bin() -> PathBuf {
    let mut path = std::env::current_exe()
        .unwrap()
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();
    path.push("biogit");
    path
}

/// Run the biogit binary in `dir` with the given arguments.
pub fn biogit(dir: &Path, args: &[&str]) -> CommandResult {
    let output = Command::new(biogit_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run biogit");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Init a repo in `dir` with a pinned identity.
pub fn init_repo(dir: &Path) {
    biogit(dir, &["init"]).assert_ok();
    biogit(dir, &["config", "user.name", "Test Author"]).assert_ok();
    biogit(dir, &["config", "user.email", "test@example.com"]).assert_ok();
}

/// Write a file and commit it.
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) {
    std::fs::write(dir.join(name), content).unwrap();
    biogit(dir, &["add", name]).assert_ok();
    biogit(dir, &["commit", "-m", message]).assert_ok();
}
