//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Run git in `dir` and return stdout, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Setup a git repository in a temp directory for testing
///
/// Creates an initialized git repo with user identity configured and no
/// commits. `_dir` must be kept alive to prevent cleanup.
pub fn setup_empty_git_repo() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir for git repo");
    let path = dir.path().to_path_buf();

    git(&path, &["init", "--quiet"]);
    git(&path, &["config", "user.email", "test@test.com"]);
    git(&path, &["config", "user.name", "Test User"]);
    git(&path, &["config", "commit.gpgsign", "false"]);

    (dir, path)
}

/// Same as [`setup_empty_git_repo`] with an initial empty commit.
pub fn setup_test_git_repo() -> (TempDir, PathBuf) {
    let (dir, path) = setup_empty_git_repo();
    git(&path, &["commit", "--quiet", "--allow-empty", "-m", "initial commit"]);
    (dir, path)
}

/// Write `contents` to `file` and commit it with `message`.
pub fn commit_file(repo: &Path, file: &str, contents: &str, message: &str) {
    let target = repo.join(file);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&target, contents).expect("Failed to write file");
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "--quiet", "-m", message]);
}

/// Commit subjects, newest first.
pub fn log_subjects(repo: &Path) -> Vec<String> {
    git(repo, &["log", "--pretty=format:%s"])
        .lines()
        .map(str::to_string)
        .collect()
}

/// Install a fake lint tool script in `repo`.
///
/// The script keeps its remaining offense count in `.offenses`. A check
/// prints the count; an autocorrect fixes up to `per_pass` offenses,
/// rewrites the counter, and touches `fixed.txt` so the tree changes.
/// The script and its state are excluded from commits via
/// `.git/info/exclude`.
#[cfg(unix)]
pub fn install_fake_linter(repo: &Path, initial_offenses: u32, per_pass: u32) -> PathBuf {
    write_fake_linter(repo, initial_offenses, per_pass, true)
}

/// Like [`install_fake_linter`], but autocorrect leaves every tracked and
/// untracked file alone.
#[cfg(unix)]
pub fn install_silent_fake_linter(
    repo: &Path,
    initial_offenses: u32,
    per_pass: u32,
) -> PathBuf {
    write_fake_linter(repo, initial_offenses, per_pass, false)
}

#[cfg(unix)]
fn write_fake_linter(
    repo: &Path,
    initial_offenses: u32,
    per_pass: u32,
    touch_tree: bool,
) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let touch = if touch_tree {
        "echo \"pass $left\" >> fixed.txt"
    } else {
        ":"
    };
    let script = repo.join("fake-lint.sh");
    let body = format!(
        r#"#!/bin/sh
state=.offenses
[ -f "$state" ] || echo {initial_offenses} > "$state"
n=$(cat "$state")
if [ "$1" = "-a" ]; then
  fix={per_pass}
  [ "$fix" -gt "$n" ] && fix=$n
  left=$((n - fix))
  echo "$left" > "$state"
  {touch}
  echo "1 file inspected, $n offenses detected, $fix offenses corrected"
  exit 1
fi
if [ "$n" -eq 0 ]; then
  echo "1 file inspected, no offenses detected"
  exit 0
fi
echo "1 file inspected, $n offenses detected"
exit 1
"#
    );
    std::fs::write(&script, body).expect("Failed to write fake linter");
    let mut perms = std::fs::metadata(&script)
        .expect("Failed to stat fake linter")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).expect("Failed to chmod fake linter");

    let exclude = repo.join(".git/info/exclude");
    let mut existing = std::fs::read_to_string(&exclude).unwrap_or_default();
    existing.push_str("\nfake-lint.sh\n.offenses\n");
    std::fs::write(&exclude, existing).expect("Failed to write exclude file");

    script
}
