//! Bare repository fixtures driven through the `git` CLI.
//!
//! Fixtures write history with the real `git` binary so the code under test
//! (which goes through libgit2) never produces its own fixtures. Inspection
//! helpers read back through `git2` to avoid parsing porcelain output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Identity used for every fixture commit.
pub const FIXTURE_NAME: &str = "Fixture Author";
pub const FIXTURE_EMAIL: &str = "fixture@example.org";

/// Run `git` in `dir` and return trimmed stdout.
///
/// # Panics
/// Panics if git cannot be spawned or exits non-zero.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` in {} failed:\n{}",
            dir.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    run_git(dir, &["config", "user.email", FIXTURE_EMAIL]);
    run_git(dir, &["config", "user.name", FIXTURE_NAME]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("write_files: failed to create {parent:?}: {e}"));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_files: failed to write {path:?}: {e}"));
    }
}

/// Scratch clone of `bare` with `branch` checked out, identity configured.
///
/// An unborn `branch` is created as an orphan.
fn scratch_clone(bare: &Path, branch: &str) -> tempfile::TempDir {
    let scratch = tempfile::tempdir()
        .unwrap_or_else(|e| panic!("scratch_clone: failed to create temp dir: {e}"));
    let work = scratch.path();
    let bare_str = bare.to_string_lossy();
    run_git(work, &["clone", "--quiet", &bare_str, "."]);
    configure_identity(work);

    let has_branch = !run_git(work, &["ls-remote", "--heads", "origin", branch]).is_empty();
    if has_branch {
        run_git(work, &["checkout", "--quiet", "-B", branch, &format!("origin/{branch}")]);
    } else {
        run_git(work, &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]);
        run_git(work, &["rm", "-rf", "--quiet", "--ignore-unmatch", "."]);
    }
    scratch
}

/// Create a bare repository at `path` holding one commit of `files` on
/// `branch`. Returns the commit id.
///
/// # Panics
/// Panics if any git operation fails.
pub fn init_bare(path: &Path, branch: &str, files: &[(&str, &str)]) -> String {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("init_bare: failed to create {path:?}: {e}"));
    run_git(path, &["init", "--quiet", "--bare"]);
    run_git(path, &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]);
    commit_to_bare(path, branch, files, "Initial import")
}

/// Commit `files` (added or overwritten) to `branch` of `bare` and push.
/// Returns the new commit id.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_to_bare(bare: &Path, branch: &str, files: &[(&str, &str)], message: &str) -> String {
    let scratch = scratch_clone(bare, branch);
    let work = scratch.path();
    write_files(work, files);
    run_git(work, &["add", "--all"]);
    run_git(work, &["commit", "--quiet", "--allow-empty", "-m", message]);
    run_git(work, &["push", "--quiet", "origin", &format!("HEAD:refs/heads/{branch}")]);
    run_git(work, &["rev-parse", "HEAD"])
}

/// Remove `file` on `branch` of `bare`. Returns the new commit id.
pub fn remove_from_bare(bare: &Path, branch: &str, file: &str, message: &str) -> String {
    let scratch = scratch_clone(bare, branch);
    let work = scratch.path();
    run_git(work, &["rm", "--quiet", file]);
    run_git(work, &["commit", "--quiet", "-m", message]);
    run_git(work, &["push", "--quiet", "origin", &format!("HEAD:refs/heads/{branch}")]);
    run_git(work, &["rev-parse", "HEAD"])
}

/// Bare clone of `source` at `dest`, sharing its full history.
pub fn mirror_bare(source: &Path, dest: &Path) -> PathBuf {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("mirror_bare: failed to create {parent:?}: {e}"));
    }
    let parent = dest.parent().unwrap_or(Path::new("."));
    run_git(
        parent,
        &[
            "clone",
            "--quiet",
            "--bare",
            &source.to_string_lossy(),
            &dest.to_string_lossy(),
        ],
    );
    dest.to_path_buf()
}

/// Full commit id at the tip of `branch`, or `None` if the branch is absent.
pub fn branch_head(bare: &Path, branch: &str) -> Option<String> {
    let repo = git2::Repository::open_bare(bare)
        .unwrap_or_else(|e| panic!("branch_head: failed to open {bare:?}: {e}"));
    repo.find_branch(branch, git2::BranchType::Local)
        .ok()
        .and_then(|b| b.get().target())
        .map(|oid| oid.to_string())
}

/// Content of `file` at the tip of `branch`, or `None` if absent.
pub fn read_blob(bare: &Path, branch: &str, file: &str) -> Option<String> {
    let repo = git2::Repository::open_bare(bare)
        .unwrap_or_else(|e| panic!("read_blob: failed to open {bare:?}: {e}"));
    let commit = repo
        .revparse_single(&format!("refs/heads/{branch}"))
        .ok()?
        .peel_to_commit()
        .ok()?;
    let entry = commit.tree().ok()?.get_path(Path::new(file)).ok()?;
    let blob = entry.to_object(&repo).ok()?.peel_to_blob().ok()?;
    Some(String::from_utf8_lossy(blob.content()).into_owned())
}

/// Tree id at the tip of `branch`.
pub fn tree_id(bare: &Path, branch: &str) -> String {
    let repo = git2::Repository::open_bare(bare)
        .unwrap_or_else(|e| panic!("tree_id: failed to open {bare:?}: {e}"));
    let commit = repo
        .revparse_single(&format!("refs/heads/{branch}"))
        .and_then(|o| o.peel_to_commit())
        .unwrap_or_else(|e| panic!("tree_id: branch {branch} not found: {e}"));
    commit.tree_id().to_string()
}

/// Commit count reachable from `branch`.
pub fn commit_count(bare: &Path, branch: &str) -> usize {
    let repo = git2::Repository::open_bare(bare)
        .unwrap_or_else(|e| panic!("commit_count: failed to open {bare:?}: {e}"));
    let mut walk = repo
        .revwalk()
        .unwrap_or_else(|e| panic!("commit_count: revwalk failed: {e}"));
    walk.push_ref(&format!("refs/heads/{branch}"))
        .unwrap_or_else(|e| panic!("commit_count: branch {branch} not found: {e}"));
    walk.count()
}

/// Summary of a single commit, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub parents: Vec<String>,
}

/// Details of the commit at the tip of `branch`.
pub fn tip_commit(bare: &Path, branch: &str) -> CommitInfo {
    let repo = git2::Repository::open_bare(bare)
        .unwrap_or_else(|e| panic!("tip_commit: failed to open {bare:?}: {e}"));
    let commit = repo
        .revparse_single(&format!("refs/heads/{branch}"))
        .and_then(|o| o.peel_to_commit())
        .unwrap_or_else(|e| panic!("tip_commit: branch {branch} not found: {e}"));
    let author = commit.author();
    CommitInfo {
        author_name: author.name().unwrap_or_default().to_string(),
        author_email: author.email().unwrap_or_default().to_string(),
        message: commit.message().unwrap_or_default().to_string(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
    }
}
