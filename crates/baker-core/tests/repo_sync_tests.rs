//! RepoSynchronizer against real bare repositories.

use std::sync::Arc;

use baker_core::fakes::{FailingVcs, MemoryLookaside};
use baker_core::{
    CacheSynchronizer, Configuration, Error, EventContext, Namespace, RepoSynchronizer,
    RetryPolicy,
};
use baker_git::Git2Client;
use baker_test_utils::forge::{SYNC_AUTHOR, SYNC_EMAIL, SYNC_MESSAGE, TestForge};
use baker_test_utils::git::{
    branch_head, commit_count, commit_to_bare, read_blob, remove_from_bare, tip_commit, tree_id,
};
use pretty_assertions::assert_eq;

const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

fn context(forge: &TestForge, merge: bool, dry_run: bool) -> EventContext {
    let yaml = forge.config_yaml(merge, true, &[("bash", "rawhide", "c10s")]);
    let config: Configuration = serde_yaml::from_str(&yaml).unwrap();
    EventContext::new(Arc::new(config), dry_run)
}

fn synchronizer(lookaside: Arc<MemoryLookaside>) -> RepoSynchronizer {
    let retry = RetryPolicy::default();
    RepoSynchronizer::new(
        Arc::new(Git2Client::new()),
        CacheSynchronizer::new(lookaside, retry),
        retry,
    )
}

/// Upstream `rawhide` and an unrelated downstream `c10s`.
fn unrelated_forge() -> TestForge {
    let forge = TestForge::new();
    forge.create_upstream(
        "rpms",
        "bash",
        "rawhide",
        &[("bash.spec", "Version: 5.2\n"), ("README.md", "upstream")],
    );
    forge.create_downstream(
        "rpms",
        "bash",
        "c10s",
        &[("bash.spec", "Version: 5.1\n"), ("gating.yaml", "rules")],
    );
    forge
}

/// Downstream `c10s` mirrored from upstream `c10s`, same history.
fn mirrored_forge() -> TestForge {
    let forge = TestForge::new();
    forge.create_upstream("rpms", "bash", "c10s", &[("bash.spec", "Version: 5.2\n")]);
    forge.mirror_downstream("rpms", "bash");
    forge
}

#[test]
fn test_merge_strategy_adds_one_squash_commit() {
    let forge = unrelated_forge();
    let upstream = forge.upstream_path("rpms", "bash");
    let downstream = forge.downstream_path("rpms", "bash");
    let upstream_head = branch_head(&upstream, "rawhide").unwrap();
    let before = branch_head(&downstream, "c10s").unwrap();

    let commit = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &context(&forge, true, false))
        .unwrap();

    assert_eq!(branch_head(&downstream, "c10s").unwrap(), commit);
    assert_eq!(commit_count(&downstream, "c10s"), 2);
    assert_eq!(tree_id(&downstream, "c10s"), tree_id(&upstream, "rawhide"));

    let tip = tip_commit(&downstream, "c10s");
    assert_eq!(tip.parents, vec![before]);
    assert_eq!(tip.author_name, SYNC_AUTHOR);
    assert_eq!(tip.author_email, SYNC_EMAIL);
    assert!(tip.message.starts_with(SYNC_MESSAGE));
    assert!(tip.message.contains(&format!(
        "Source: {}#{}",
        upstream.display(),
        upstream_head
    )));
}

#[test]
fn test_merge_strategy_only_touches_destination_branch() {
    let forge = unrelated_forge();
    let downstream = forge.downstream_path("rpms", "bash");

    synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &context(&forge, true, false))
        .unwrap();

    let repo = git2::Repository::open_bare(&downstream).unwrap();
    let branches: Vec<String> = repo
        .branches(Some(git2::BranchType::Local))
        .unwrap()
        .map(|b| b.unwrap().0.name().unwrap().unwrap().to_string())
        .collect();
    assert_eq!(branches, vec!["c10s".to_string()]);
}

#[test]
fn test_fast_forward_strategy_advances_downstream() {
    let forge = mirrored_forge();
    let upstream = forge.upstream_path("rpms", "bash");
    let downstream = forge.downstream_path("rpms", "bash");
    let yaml = forge.config_yaml(false, true, &[("bash", "c10s", "c10s")]);
    let ctx = EventContext::new(Arc::new(serde_yaml::from_str(&yaml).unwrap()), false);

    let new_head = commit_to_bare(&upstream, "c10s", &[("bash.spec", "Version: 5.3\n")], "update");
    let commit = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &ctx)
        .unwrap();

    assert_eq!(commit, new_head);
    assert_eq!(branch_head(&downstream, "c10s").unwrap(), new_head);
    assert_eq!(
        read_blob(&downstream, "c10s", "bash.spec").as_deref(),
        Some("Version: 5.3\n")
    );
}

#[test]
fn test_upstream_removal_reaches_downstream() {
    let forge = unrelated_forge();
    let upstream = forge.upstream_path("rpms", "bash");
    let downstream = forge.downstream_path("rpms", "bash");
    remove_from_bare(&upstream, "rawhide", "README.md", "drop readme");

    synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &context(&forge, true, false))
        .unwrap();

    assert_eq!(read_blob(&downstream, "c10s", "README.md"), None);
    assert_eq!(tree_id(&downstream, "c10s"), tree_id(&upstream, "rawhide"));
}

#[test]
fn test_fast_forward_sync_is_idempotent() {
    let forge = mirrored_forge();
    let yaml = forge.config_yaml(false, true, &[("bash", "c10s", "c10s")]);
    let ctx = EventContext::new(Arc::new(serde_yaml::from_str(&yaml).unwrap()), false);
    let sync = synchronizer(Arc::new(MemoryLookaside::new()));

    let first = sync.sync_repo("bash", Namespace::Rpms, &ctx).unwrap();
    let second = sync.sync_repo("bash", Namespace::Rpms, &ctx).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_fast_forward_diverged_is_reconciliation_error() {
    let forge = mirrored_forge();
    let upstream = forge.upstream_path("rpms", "bash");
    let downstream = forge.downstream_path("rpms", "bash");
    commit_to_bare(&upstream, "c10s", &[("a", "upstream")], "upstream");
    let downstream_head = commit_to_bare(&downstream, "c10s", &[("a", "downstream")], "downstream");

    let yaml = forge.config_yaml(false, true, &[("bash", "c10s", "c10s")]);
    let ctx = EventContext::new(Arc::new(serde_yaml::from_str(&yaml).unwrap()), false);

    let err = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &ctx)
        .unwrap_err();

    assert!(matches!(err, Error::Reconciliation { ref component, .. } if component == "bash"));
    assert_eq!(branch_head(&downstream, "c10s").unwrap(), downstream_head);
}

#[test]
fn test_dry_run_leaves_downstream_untouched() {
    let forge = unrelated_forge();
    let downstream = forge.downstream_path("rpms", "bash");
    let before = branch_head(&downstream, "c10s").unwrap();

    let commit = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &context(&forge, true, true))
        .unwrap();

    assert_ne!(commit, before);
    assert_eq!(branch_head(&downstream, "c10s").unwrap(), before);
}

#[test]
fn test_sources_manifest_triggers_cache_sync() {
    let forge = unrelated_forge();
    let upstream = forge.upstream_path("rpms", "bash");
    commit_to_bare(
        &upstream,
        "rawhide",
        &[("sources", format!("{EMPTY_MD5}  bash-5.2.tar.gz\n").as_str())],
        "add sources",
    );
    let ctx = context(&forge, true, false);
    let lookaside = Arc::new(MemoryLookaside::new());
    lookaside.insert(&ctx.config.settings.source.cache, "rpms/bash", "bash-5.2.tar.gz", b"");

    synchronizer(lookaside.clone())
        .sync_repo("bash", Namespace::Rpms, &ctx)
        .unwrap();

    assert!(lookaside.contains(
        &ctx.config.settings.destination.cache,
        "rpms/bash",
        "bash-5.2.tar.gz"
    ));
}

#[test]
fn test_cache_failure_aborts_before_push() {
    let forge = unrelated_forge();
    let upstream = forge.upstream_path("rpms", "bash");
    let downstream = forge.downstream_path("rpms", "bash");
    commit_to_bare(
        &upstream,
        "rawhide",
        &[("sources", format!("{EMPTY_MD5}  missing.tar.gz\n").as_str())],
        "add sources",
    );
    let before = branch_head(&downstream, "c10s").unwrap();

    let err = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &context(&forge, true, false))
        .unwrap_err();

    assert!(matches!(err.root_cause(), Error::Cache { .. }));
    assert_eq!(branch_head(&downstream, "c10s").unwrap(), before);
}

#[test]
fn test_unknown_component() {
    let forge = unrelated_forge();
    let err = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("zsh", Namespace::Rpms, &context(&forge, true, false))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownComponent { .. }));
}

#[test]
fn test_clone_gives_up_after_five_attempts() {
    let forge = unrelated_forge();
    let vcs = Arc::new(FailingVcs::new());
    let retry = RetryPolicy::default();
    let sync = RepoSynchronizer::new(
        vcs.clone(),
        CacheSynchronizer::new(Arc::new(MemoryLookaside::new()), retry),
        retry,
    );

    let err = sync
        .sync_repo("bash", Namespace::Rpms, &context(&forge, true, false))
        .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 5, .. }));
    assert_eq!(vcs.attempts(), 5);
}

#[test]
fn test_missing_upstream_branch_exhausts_fetch() {
    let forge = unrelated_forge();
    let yaml = forge.config_yaml(true, true, &[("bash", "no-such-branch", "c10s")]);
    let ctx = EventContext::new(Arc::new(serde_yaml::from_str(&yaml).unwrap()), false);

    let err = synchronizer(Arc::new(MemoryLookaside::new()))
        .sync_repo("bash", Namespace::Rpms, &ctx)
        .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { ref operation, .. } if operation == "fetch source"));
}
