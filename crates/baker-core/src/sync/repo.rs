//! RepoSynchronizer implementation

use std::sync::Arc;

use baker_git::naming::temp_prefix;
use baker_git::{FastForward, PushMode, ScmLocator, VcsClient, Worktree};

use crate::cache::CacheSynchronizer;
use crate::config::remove_partial;
use crate::context::EventContext;
use crate::namespace::Namespace;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Remote name the upstream repository is registered under.
pub const SOURCE_REMOTE: &str = "source";
/// Remote name of the cloned downstream repository.
pub const DESTINATION_REMOTE: &str = "origin";
/// Cache manifest looked up at the root of the working tree.
pub const MANIFEST_FILE: &str = "sources";
/// Message of the history-unifying commit on the throwaway branch.
const UNIFY_MESSAGE: &str = "Temporary working tree merge";

/// Reconciles a component's downstream branch with its upstream branch.
pub struct RepoSynchronizer {
    vcs: Arc<dyn VcsClient>,
    cache: CacheSynchronizer,
    retry: RetryPolicy,
}

impl RepoSynchronizer {
    pub fn new(vcs: Arc<dyn VcsClient>, cache: CacheSynchronizer, retry: RetryPolicy) -> Self {
        Self { vcs, cache, retry }
    }

    /// Synchronize one component and return the commit id now at the tip of
    /// the downstream branch (or the would-be tip in dry-run mode).
    ///
    /// # Errors
    ///
    /// Fails without touching the downstream remote when cloning, fetching,
    /// reconciling or cache synchronization fails. Push failures surface
    /// after the retry budget is spent.
    pub fn sync_repo(
        &self,
        component: &str,
        namespace: Namespace,
        ctx: &EventContext,
    ) -> Result<String> {
        let config = &ctx.config;
        let unknown = || Error::UnknownComponent {
            namespace: namespace.to_string(),
            component: component.to_string(),
        };
        let source = config
            .source_locator(namespace, component)
            .ok_or_else(unknown)?;
        let destination = config
            .destination_locator(namespace, component)
            .ok_or_else(unknown)?;

        tracing::info!(
            component,
            %namespace,
            source = %source,
            destination = %destination,
            dry_run = ctx.dry_run,
            "Synchronizing repository"
        );

        let workdir = tempfile::Builder::new()
            .prefix(&temp_prefix("repo", namespace.as_str(), component))
            .tempdir()?;
        let checkout = workdir.path().join(component);

        let tree = self.retry.run("clone destination", |_| {
            remove_partial(&checkout)?;
            Ok(self.vcs.clone_branch(&destination, &checkout)?)
        })?;

        tree.add_remote(SOURCE_REMOTE, &source.url)?;
        let source_head = self.retry.run("fetch source", |_| {
            Ok(tree.fetch(SOURCE_REMOTE, &source.reference)?)
        })?;
        tracing::debug!(component, source_head = %source_head, "Fetched upstream");

        tree.set_identity(&config.settings.git.identity())?;

        let reconciled = if config.settings.control.merge {
            self.merge_preserving(tree.as_ref(), &source, &destination, &source_head, ctx)
        } else {
            fast_forward_only(tree.as_ref(), &source)
        };
        reconciled.map_err(|e| match e {
            Error::Git(source) if source.is_conflict() => Error::Reconciliation {
                component: component.to_string(),
                source,
            },
            other => other,
        })?;

        let manifest = tree.path().join(MANIFEST_FILE);
        if manifest.is_file() {
            self.cache.sync_cache(component, namespace, &manifest, ctx)?;
        } else {
            tracing::debug!(component, "No sources manifest, skipping cache");
        }

        let mode = PushMode::from_dry_run(ctx.dry_run);
        self.retry.run("push destination", |_| {
            Ok(tree.push(DESTINATION_REMOTE, &destination.reference, mode)?)
        })?;

        let head = tree.rev_parse("HEAD")?;
        tracing::info!(component, %namespace, commit = %head, "Repository synchronized");
        Ok(head)
    }

    /// Squash the upstream tree onto the downstream branch.
    ///
    /// The throwaway branch first records downstream as a parent without
    /// taking any of its content, so the squash result is exactly the
    /// upstream tree while downstream keeps its own linear history.
    fn merge_preserving(
        &self,
        tree: &dyn Worktree,
        source: &ScmLocator,
        destination: &ScmLocator,
        source_head: &str,
        ctx: &EventContext,
    ) -> Result<()> {
        let throwaway = format!("distrobaker-{}", uuid::Uuid::new_v4().simple());
        let upstream_ref = remote_ref(source);

        tree.create_branch(&throwaway, &upstream_ref)?;
        tree.merge_ours(&destination.reference, UNIFY_MESSAGE)?;
        tree.checkout(&destination.reference)?;
        tree.squash_merge(&throwaway)?;

        let message = format!(
            "{}\nSource: {}#{}",
            ctx.config.settings.git.message, source.url, source_head
        );
        let commit = tree.commit(&message)?;
        tracing::debug!(commit = %commit, branch = %throwaway, "Squash commit created");
        Ok(())
    }
}

fn fast_forward_only(tree: &dyn Worktree, source: &ScmLocator) -> Result<()> {
    match tree.fast_forward(&remote_ref(source))? {
        FastForward::UpToDate => tracing::info!("Already up to date"),
        FastForward::Advanced { to } => tracing::info!(commit = %to, "Fast-forwarded"),
    }
    Ok(())
}

fn remote_ref(source: &ScmLocator) -> String {
    format!("refs/remotes/{}/{}", SOURCE_REMOTE, source.reference)
}
