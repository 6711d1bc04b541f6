//! Porcelain command coverage: init/add/commit/status/log/branch/switch/
//! tag/diff/merge through the real binary.

mod common;

use common::{biogit, commit_file, init_repo};
use std::fs;
use tempfile::TempDir;

#[test]
fn init_creates_repository_layout() {
    let dir = TempDir::new().unwrap();
    let result = biogit(dir.path(), &["init"]);
    result.assert_ok();
    assert!(result.stdout.contains("Initialized empty biogit repository"));
    assert!(dir.path().join(".biogit/objects").is_dir());
    assert!(dir.path().join(".biogit/refs/heads").is_dir());

    let head = fs::read_to_string(dir.path().join(".biogit/HEAD")).unwrap();
    assert_eq!(head, "ref: refs/heads/main\n");
}

#[test]
fn add_commit_updates_head_and_branch() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "hello.txt", "hi\n", "m");

    let main = fs::read_to_string(dir.path().join(".biogit/refs/heads/main")).unwrap();
    let head_commit = main.trim();
    assert_eq!(head_commit.len(), 40);

    // The object exists in the store under its shard path.
    let shard = dir
        .path()
        .join(".biogit/objects")
        .join(&head_commit[..2])
        .join(&head_commit[2..]);
    assert!(shard.is_file());
}

#[test]
fn status_reports_each_stage_of_a_file() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());

    fs::write(dir.path().join("f.txt"), "1\n").unwrap();
    let result = biogit(dir.path(), &["status"]);
    result.assert_ok();
    assert!(result.stdout.contains("Untracked files:"));

    biogit(dir.path(), &["add", "f.txt"]).assert_ok();
    let result = biogit(dir.path(), &["status"]);
    assert!(result.stdout.contains("new file:   f.txt"));

    biogit(dir.path(), &["commit", "-m", "c"]).assert_ok();
    let result = biogit(dir.path(), &["status"]);
    assert!(result.stdout.contains("nothing to commit, working tree clean"));

    fs::write(dir.path().join("f.txt"), "2\n").unwrap();
    let result = biogit(dir.path(), &["status"]);
    assert!(result.stdout.contains("modified:   f.txt"));
}

#[test]
fn log_lists_commits_newest_first() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "a.txt", "1\n", "first");
    commit_file(dir.path(), "a.txt", "2\n", "second");

    let result = biogit(dir.path(), &["log"]);
    result.assert_ok();
    let first_pos = result.stdout.find("first").unwrap();
    let second_pos = result.stdout.find("second").unwrap();
    assert!(second_pos < first_pos, "newest commit should print first");
    assert!(result.stdout.contains("Author: Test Author <test@example.com>"));
}

#[test]
fn branch_switch_roundtrip() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "hello.txt", "hi\n", "base");

    biogit(dir.path(), &["branch", "dev"]).assert_ok();
    let result = biogit(dir.path(), &["branch"]);
    assert!(result.stdout.contains("* main"));
    assert!(result.stdout.contains("  dev"));

    biogit(dir.path(), &["switch", "dev"]).assert_ok();
    commit_file(dir.path(), "hello.txt", "hi there\n", "dev work");

    biogit(dir.path(), &["switch", "main"]).assert_ok();
    assert_eq!(fs::read_to_string(dir.path().join("hello.txt")).unwrap(), "hi\n");
}

#[test]
fn tag_create_and_list() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "a.txt", "1\n", "base");

    biogit(dir.path(), &["tag", "v1.0"]).assert_ok();
    let result = biogit(dir.path(), &["tag"]);
    assert!(result.stdout.contains("v1.0"));

    biogit(dir.path(), &["tag", "-d", "v1.0"]).assert_ok();
    let result = biogit(dir.path(), &["tag"]);
    assert!(!result.stdout.contains("v1.0"));
}

#[test]
fn diff_shows_unified_hunks() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "f.txt", "a\nb\nc\n", "base");
    fs::write(dir.path().join("f.txt"), "a\nB\nc\n").unwrap();

    let result = biogit(dir.path(), &["diff"]);
    result.assert_ok();
    assert!(result.stdout.contains("--- a/f.txt"));
    assert!(result.stdout.contains("+++ b/f.txt"));
    assert!(result.stdout.contains("@@ -1,3 +1,3 @@"));
    assert!(result.stdout.contains("-b"));
    assert!(result.stdout.contains("+B"));

    // Staged view is empty until the change is added.
    let staged = biogit(dir.path(), &["diff", "--staged"]);
    assert!(staged.stdout.is_empty());
    biogit(dir.path(), &["add", "f.txt"]).assert_ok();
    let staged = biogit(dir.path(), &["diff", "--staged"]);
    assert!(staged.stdout.contains("+B"));
}

#[test]
fn merge_conflict_exits_nonzero_and_marks_file() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "a", "1\n2\n3\n", "base");

    biogit(dir.path(), &["branch", "theirs"]).assert_ok();
    biogit(dir.path(), &["switch", "theirs"]).assert_ok();
    commit_file(dir.path(), "a", "1\ntheirs\n3\n", "theirs");

    biogit(dir.path(), &["switch", "main"]).assert_ok();
    commit_file(dir.path(), "a", "1\nours\n3\n", "ours");

    let result = biogit(dir.path(), &["merge", "theirs"]);
    result.assert_fails();
    assert!(result.stdout.contains("CONFLICT (content): merge conflict in a"));

    let text = fs::read_to_string(dir.path().join("a")).unwrap();
    assert!(text.contains("<<<<<<< ours"));
    assert!(text.contains("======="));
    assert!(text.contains(">>>>>>> theirs"));
    assert!(dir.path().join(".biogit/MERGE_HEAD").is_file());
    let conflicts = fs::read_to_string(dir.path().join(".biogit/BIOGIT_CONFLICTS")).unwrap();
    assert_eq!(conflicts, "a\n");
}

#[test]
fn rm_refuses_without_pathspec() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    biogit(dir.path(), &["rm"]).assert_fails();
}

#[test]
fn config_get_set_list() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());

    let result = biogit(dir.path(), &["config", "user.name"]);
    result.assert_ok();
    assert_eq!(result.stdout.trim(), "Test Author");

    let result = biogit(dir.path(), &["config", "-l"]);
    assert!(result.stdout.contains("user.email=test@example.com"));

    // Missing key exits 1.
    biogit(dir.path(), &["config", "user.ghost"]).assert_fails();
}

#[test]
fn commands_outside_repo_fail() {
    let dir = TempDir::new().unwrap();
    let result = biogit(dir.path(), &["status"]);
    result.assert_fails();
    assert!(result.stderr.contains("fatal:"));
}
