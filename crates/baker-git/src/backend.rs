//! libgit2-backed implementation of the version-control traits

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    BranchType, Commit, Cred, CredentialType, Direction, FetchOptions, PushOptions,
    RemoteCallbacks, Repository,
};

use crate::client::{FastForward, Identity, PushMode, VcsClient, Worktree};
use crate::{Error, Result, ScmLocator};

/// Upper bound on credential callback invocations per operation.
///
/// libgit2 keeps asking for credentials as long as authentication fails, so
/// the callback has to give up on its own.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Remote callbacks resolving credentials from the SSH agent or the
/// configured git credential helpers.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0u32;
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("exhausted credential sources"));
        }
        if allowed.contains(CredentialType::SSH_KEY)
            && let Some(user) = username
        {
            return Cred::ssh_key_from_agent(user);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        Err(git2::Error::from_str("no supported credential type offered"))
    });
    callbacks
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut opts = FetchOptions::new();
    opts.remote_callbacks(remote_callbacks());
    opts
}

fn forced_checkout() -> CheckoutBuilder<'static> {
    let mut checkout = CheckoutBuilder::new();
    checkout.force();
    checkout
}

/// [`VcsClient`] backed by libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Client;

impl Git2Client {
    pub fn new() -> Self {
        Self
    }
}

impl VcsClient for Git2Client {
    fn clone_branch(&self, locator: &ScmLocator, into: &Path) -> Result<Box<dyn Worktree>> {
        tracing::debug!(
            url = %locator.url,
            branch = %locator.reference,
            path = %into.display(),
            "Cloning repository"
        );

        let mut builder = RepoBuilder::new();
        builder.branch(&locator.reference);
        builder.fetch_options(fetch_options());
        let repo = builder.clone(&locator.url, into)?;

        Ok(Box::new(Git2Worktree {
            repo,
            path: into.to_path_buf(),
        }))
    }
}

/// A working tree opened through libgit2.
pub struct Git2Worktree {
    repo: Repository,
    path: PathBuf,
}

impl Git2Worktree {
    fn commit_for(&self, spec: &str) -> Result<Commit<'_>> {
        let object = self
            .repo
            .revparse_single(spec)
            .map_err(|_| Error::RefNotFound {
                spec: spec.to_string(),
            })?;
        Ok(object.peel_to_commit()?)
    }

    fn head_commit(&self) -> Result<Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    fn switch_head(&self, branch: &str) -> Result<()> {
        self.repo.set_head(&format!("refs/heads/{}", branch))?;
        self.repo.checkout_head(Some(&mut forced_checkout()))?;
        Ok(())
    }
}

impl Worktree for Git2Worktree {
    fn path(&self) -> &Path {
        &self.path
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo.remote(name, url)?;
        Ok(())
    }

    fn fetch(&self, remote: &str, branch: &str) -> Result<String> {
        let mut handle = self
            .repo
            .find_remote(remote)
            .map_err(|_| Error::RemoteNotFound {
                name: remote.to_string(),
            })?;

        let refspec = format!("+refs/heads/{}:refs/remotes/{}/{}", branch, remote, branch);
        handle.fetch(&[&refspec], Some(&mut fetch_options()), None)?;

        self.rev_parse(&format!("refs/remotes/{}/{}", remote, branch))
    }

    fn set_identity(&self, identity: &Identity) -> Result<()> {
        let mut config = self.repo.config()?;
        config.set_str("user.name", &identity.name)?;
        config.set_str("user.email", &identity.email)?;
        Ok(())
    }

    fn rev_parse(&self, spec: &str) -> Result<String> {
        Ok(self.commit_for(spec)?.id().to_string())
    }

    fn create_branch(&self, name: &str, start: &str) -> Result<()> {
        let commit = self.commit_for(start)?;
        self.repo.branch(name, &commit, true)?;
        self.switch_head(name)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| Error::RefNotFound {
                spec: branch.to_string(),
            })?;
        self.switch_head(branch)
    }

    fn merge_ours(&self, other: &str, message: &str) -> Result<String> {
        let head = self.head_commit()?;
        let other_commit = self.commit_for(other)?;
        let tree = head.tree()?;
        let signature = self.repo.signature()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&head, &other_commit],
        )?;
        Ok(oid.to_string())
    }

    fn squash_merge(&self, branch: &str) -> Result<()> {
        let head = self.head_commit()?;
        let theirs = self.commit_for(branch)?;

        let mut merged = self.repo.merge_commits(&head, &theirs, None)?;
        if merged.has_conflicts() {
            return Err(Error::MergeConflict {
                message: format!("squash merge of '{}' into HEAD has conflicts", branch),
            });
        }

        // checkout_tree updates both the index and the working tree, removing
        // files the merged tree no longer contains.
        let tree_id = merged.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;
        self.repo
            .checkout_tree(tree.as_object(), Some(&mut forced_checkout()))?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let signature = self.repo.signature()?;
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.head_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(oid.to_string())
    }

    fn fast_forward(&self, target: &str) -> Result<FastForward> {
        let target_commit = self.commit_for(target)?;
        let annotated = self.repo.find_annotated_commit(target_commit.id())?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            return Ok(FastForward::UpToDate);
        }

        let head = self.repo.head()?;
        let head_id = head.peel_to_commit()?.id();
        let refname = head
            .name()
            .ok_or_else(|| git2::Error::from_str("HEAD reference name is not valid UTF-8"))?
            .to_string();

        if analysis.is_fast_forward() {
            let mut reference = self.repo.find_reference(&refname)?;
            reference.set_target(
                target_commit.id(),
                &format!("fast-forward to {}", target_commit.id()),
            )?;
            self.repo.checkout_head(Some(&mut forced_checkout()))?;
            return Ok(FastForward::Advanced {
                to: target_commit.id().to_string(),
            });
        }

        Err(Error::CannotFastForward {
            message: format!(
                "{} at {} has diverged from {} at {}",
                refname,
                head_id,
                target,
                target_commit.id()
            ),
        })
    }

    fn push(&self, remote: &str, branch: &str, mode: PushMode) -> Result<()> {
        let mut handle = self
            .repo
            .find_remote(remote)
            .map_err(|_| Error::RemoteNotFound {
                name: remote.to_string(),
            })?;

        match mode {
            PushMode::DryRun => {
                let connection =
                    handle.connect_auth(Direction::Push, Some(remote_callbacks()), None)?;
                let advertised = connection.list()?.len();
                tracing::debug!(
                    remote = %remote,
                    branch = %branch,
                    advertised,
                    "Push connection validated without sending"
                );
                Ok(())
            }
            PushMode::Update => {
                let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
                let rejection: RefCell<Option<(String, String)>> = RefCell::new(None);
                {
                    let mut callbacks = remote_callbacks();
                    callbacks.push_update_reference(|refname, status| {
                        if let Some(message) = status {
                            *rejection.borrow_mut() =
                                Some((refname.to_string(), message.to_string()));
                        }
                        Ok(())
                    });
                    let mut opts = PushOptions::new();
                    opts.remote_callbacks(callbacks);
                    handle.push(&[&refspec], Some(&mut opts))?;
                }

                match rejection.into_inner() {
                    Some((refname, message)) => Err(Error::PushRejected { refname, message }),
                    None => Ok(()),
                }
            }
        }
    }
}
