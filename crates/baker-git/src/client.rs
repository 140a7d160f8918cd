//! Client traits for version-control operations

use std::path::Path;

use crate::{Result, ScmLocator};

/// Commit identity applied to a working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// How a push should treat the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Update the remote branch.
    Update,
    /// Connect and authenticate for a push without sending anything.
    DryRun,
}

impl PushMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Update }
    }
}

/// Result of a fast-forward attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastForward {
    /// The branch already contained the target.
    UpToDate,
    /// The branch pointer moved to the given commit.
    Advanced { to: String },
}

/// Entry point for obtaining working trees.
pub trait VcsClient: Send + Sync {
    /// Clone `locator.url` with `locator.reference` checked out into `into`.
    ///
    /// `into` must not exist or be an empty directory.
    fn clone_branch(&self, locator: &ScmLocator, into: &Path) -> Result<Box<dyn Worktree>>;
}

/// A checked-out working tree.
///
/// Ref arguments accept anything the backend can resolve to a commit:
/// branch names, `remote/branch` shorthands or full ref names.
pub trait Worktree {
    /// Root of the working tree.
    fn path(&self) -> &Path;

    /// Register an additional remote.
    fn add_remote(&self, name: &str, url: &str) -> Result<()>;

    /// Fetch `branch` from `remote` into `refs/remotes/<remote>/<branch>`.
    ///
    /// Returns the fetched commit id.
    fn fetch(&self, remote: &str, branch: &str) -> Result<String>;

    /// Set the author/committer identity used by subsequent commits.
    fn set_identity(&self, identity: &Identity) -> Result<()>;

    /// Resolve a ref to a full commit id.
    fn rev_parse(&self, spec: &str) -> Result<String>;

    /// Create (or reset) local branch `name` at `start` and check it out.
    fn create_branch(&self, name: &str, start: &str) -> Result<()>;

    /// Check out an existing local branch.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Record `other` as a second parent of HEAD without changing content
    /// (the "ours" strategy). Returns the new commit id.
    fn merge_ours(&self, other: &str, message: &str) -> Result<String>;

    /// Stage the result of merging `branch` into HEAD without committing
    /// and without recording `branch` as a parent.
    fn squash_merge(&self, branch: &str) -> Result<()>;

    /// Commit the staged content on top of HEAD. Empty commits are allowed.
    fn commit(&self, message: &str) -> Result<String>;

    /// Advance the current branch to `target` if that is a fast-forward.
    fn fast_forward(&self, target: &str) -> Result<FastForward>;

    /// Push local `branch` to the same-named branch of `remote`.
    fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<()>;
}
