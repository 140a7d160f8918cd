//! End-to-end tests for the event pipeline
//!
//! Real git repositories on both sides, in-memory lookaside caches and a
//! recording build system: tag event -> sync -> cache -> build.

use std::sync::Arc;

use baker_core::fakes::{MemoryLookaside, RecordingBuildSystem};
use baker_core::{
    BuildRequest, Configuration, EventContext, EventOutcome, Message, Pipeline, RetryPolicy,
    Submission,
};
use baker_git::Git2Client;
use baker_test_utils::forge::{MODULES_TRIGGER, RPMS_TRIGGER, TestForge};
use baker_test_utils::git::{branch_head, commit_to_bare, tree_id};
use pretty_assertions::assert_eq;
use serde_json::json;

const TASK_ID: u64 = 4242;
const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

struct Harness {
    forge: TestForge,
    lookaside: Arc<MemoryLookaside>,
    builds: Arc<RecordingBuildSystem>,
    pipeline: Pipeline,
}

impl Harness {
    fn new() -> Self {
        let lookaside = Arc::new(MemoryLookaside::new());
        let builds = Arc::new(RecordingBuildSystem::new(TASK_ID));
        let pipeline = Pipeline::new(
            Arc::new(Git2Client::new()),
            lookaside.clone(),
            builds.clone(),
            RetryPolicy::default(),
        );
        Self {
            forge: TestForge::new(),
            lookaside,
            builds,
            pipeline,
        }
    }

    /// Upstream bash on `rawhide`, unrelated downstream bash on `c10s`.
    fn with_bash(self) -> Self {
        self.forge.create_upstream(
            "rpms",
            "bash",
            "rawhide",
            &[("bash.spec", "Version: 5.2\n"), ("README.md", "upstream")],
        );
        self.forge
            .create_downstream("rpms", "bash", "c10s", &[("bash.spec", "Version: 5.1\n")]);
        self
    }

    fn context(&self, build: bool, dry_run: bool) -> EventContext {
        let yaml = self
            .forge
            .config_yaml(true, build, &[("bash", "rawhide", "c10s")]);
        let config: Configuration = serde_yaml::from_str(&yaml).unwrap();
        EventContext::new(Arc::new(config), dry_run)
    }

    fn process(&self, message: &Message, ctx: &EventContext) -> EventOutcome {
        self.pipeline.dispatcher().process_message(message, ctx)
    }
}

fn tag_event(component: &str, tag: &str) -> Message {
    Message::new(
        "org.fedoraproject.prod.buildsys.tag",
        json!({"name": component, "tag": tag, "instance": "primary"}),
    )
}

#[test]
fn test_tag_event_syncs_and_builds() {
    let harness = Harness::new().with_bash();
    let downstream = harness.forge.downstream_path("rpms", "bash");
    let upstream = harness.forge.upstream_path("rpms", "bash");

    let outcome = harness.process(&tag_event("bash", RPMS_TRIGGER), &harness.context(true, false));

    let head = branch_head(&downstream, "c10s").unwrap();
    assert_eq!(
        outcome,
        EventOutcome::Built {
            component: "bash".into(),
            commit: head.clone(),
            submission: Submission::Task(TASK_ID),
        }
    );
    assert_eq!(tree_id(&downstream, "c10s"), tree_id(&upstream, "rawhide"));
    assert_eq!(harness.builds.authentications(), vec!["downstream".to_string()]);
    assert_eq!(
        harness.builds.submissions(),
        vec![BuildRequest {
            source: format!("git+https://downstream.invalid/rpms/bash#{}", head),
            target: "f39-candidate".into(),
            scratch: true,
        }]
    );
}

#[test]
fn test_dry_run_authenticates_but_changes_nothing() {
    let harness = Harness::new().with_bash();
    let downstream = harness.forge.downstream_path("rpms", "bash");
    let before = branch_head(&downstream, "c10s");

    let outcome = harness.process(&tag_event("bash", RPMS_TRIGGER), &harness.context(true, true));

    assert!(matches!(
        outcome,
        EventOutcome::Built {
            submission: Submission::DryRun,
            ..
        }
    ));
    assert_eq!(branch_head(&downstream, "c10s"), before);
    assert_eq!(harness.builds.authentications().len(), 1);
    assert!(harness.builds.submissions().is_empty());
}

#[test]
fn test_failed_sync_never_reaches_build_system() {
    // No repositories exist on either side.
    let harness = Harness::new();

    let outcome = harness.process(&tag_event("bash", RPMS_TRIGGER), &harness.context(true, false));

    assert_eq!(outcome.label(), "sync-failed");
    assert!(harness.builds.authentications().is_empty());
    assert!(harness.builds.submissions().is_empty());
}

#[test]
fn test_builds_disabled_stops_after_sync() {
    let harness = Harness::new().with_bash();

    let outcome = harness.process(&tag_event("bash", RPMS_TRIGGER), &harness.context(false, false));

    assert_eq!(outcome.label(), "synced");
    assert!(harness.builds.authentications().is_empty());
}

#[test]
fn test_module_trigger_is_not_implemented() {
    let harness = Harness::new().with_bash();
    let downstream = harness.forge.downstream_path("rpms", "bash");
    let before = branch_head(&downstream, "c10s");

    let outcome = harness.process(&tag_event("bash", MODULES_TRIGGER), &harness.context(true, false));

    assert_eq!(outcome.label(), "not-implemented");
    assert_eq!(branch_head(&downstream, "c10s"), before);
    assert!(harness.builds.authentications().is_empty());
}

#[test]
fn test_unconfigured_component_is_ignored() {
    let harness = Harness::new().with_bash();

    let outcome = harness.process(&tag_event("zsh", RPMS_TRIGGER), &harness.context(true, false));

    assert_eq!(outcome.label(), "ignored");
    assert!(harness.builds.authentications().is_empty());
}

#[test]
fn test_sources_are_copied_between_caches() {
    let harness = Harness::new().with_bash();
    let upstream = harness.forge.upstream_path("rpms", "bash");
    commit_to_bare(
        &upstream,
        "rawhide",
        &[(
            "sources",
            format!("{EMPTY_MD5}  bash-5.2.tar.gz\n{EMPTY_MD5}  bash-5.2.tar.gz.sig\n").as_str(),
        )],
        "add sources",
    );
    let ctx = harness.context(true, false);
    let source = &ctx.config.settings.source.cache;
    let destination = &ctx.config.settings.destination.cache;
    harness.lookaside.insert(source, "rpms/bash", "bash-5.2.tar.gz", b"");
    harness.lookaside.insert(source, "rpms/bash", "bash-5.2.tar.gz.sig", b"");
    harness.lookaside.insert(destination, "rpms/bash", "bash-5.2.tar.gz.sig", b"");

    let outcome = harness.process(&tag_event("bash", RPMS_TRIGGER), &ctx);

    assert_eq!(outcome.label(), "built");
    assert!(harness.lookaside.contains(destination, "rpms/bash", "bash-5.2.tar.gz"));
    assert_eq!(harness.lookaside.upload_count(), 1);
}

#[test]
fn test_missing_source_file_fails_event_without_push() {
    let harness = Harness::new().with_bash();
    let upstream = harness.forge.upstream_path("rpms", "bash");
    let downstream = harness.forge.downstream_path("rpms", "bash");
    commit_to_bare(
        &upstream,
        "rawhide",
        &[("sources", format!("{EMPTY_MD5}  gone.tar.gz\n").as_str())],
        "add sources",
    );
    let before = branch_head(&downstream, "c10s");

    let outcome = harness.process(&tag_event("bash", RPMS_TRIGGER), &harness.context(true, false));

    assert_eq!(outcome.label(), "sync-failed");
    assert_eq!(branch_head(&downstream, "c10s"), before);
    assert!(harness.builds.submissions().is_empty());
}
