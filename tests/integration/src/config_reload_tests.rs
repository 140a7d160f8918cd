//! Configuration loading and replacement against a running pipeline.

use std::sync::Arc;

use assert_fs::prelude::*;
use baker_core::fakes::{MemoryLookaside, RecordingBuildSystem};
use baker_core::{
    ConfigLoader, ConfigSource, ConfigurationStore, EventContext, Message, Pipeline, RetryPolicy,
};
use baker_git::Git2Client;
use baker_test_utils::forge::{RPMS_TRIGGER, TestForge};
use baker_test_utils::git::{branch_head, init_bare};
use pretty_assertions::assert_eq;
use serde_json::json;

fn pipeline() -> Pipeline {
    Pipeline::new(
        Arc::new(Git2Client::new()),
        Arc::new(MemoryLookaside::new()),
        Arc::new(RecordingBuildSystem::new(1)),
        RetryPolicy::default(),
    )
}

fn loader() -> ConfigLoader {
    ConfigLoader::new(Arc::new(Git2Client::new()), RetryPolicy::default())
}

fn bash_tag() -> Message {
    Message::new(
        "org.fedoraproject.prod.buildsys.tag",
        json!({"name": "bash", "tag": RPMS_TRIGGER}),
    )
}

fn forge_with_bash() -> TestForge {
    let forge = TestForge::new();
    forge.create_upstream("rpms", "bash", "rawhide", &[("bash.spec", "Version: 5.2\n")]);
    forge.create_downstream("rpms", "bash", "c10s", &[("bash.spec", "Version: 5.1\n")]);
    forge
}

#[test]
fn test_replaced_configuration_applies_to_next_event() {
    let forge = forge_with_bash();
    let pipeline = pipeline();
    let empty = loader()
        .load(&ConfigSource::Local(forge.write_config(true, false, &[])))
        .unwrap();
    let store = ConfigurationStore::new(empty.config);

    let before = EventContext::new(store.snapshot(), false);
    assert_eq!(
        pipeline.dispatcher().process_message(&bash_tag(), &before).label(),
        "ignored"
    );

    let with_bash = loader()
        .load(&ConfigSource::Local(
            forge.write_config(true, false, &[("bash", "rawhide", "c10s")]),
        ))
        .unwrap();
    let generation = store.replace(with_bash.config);
    assert!(generation > 0);

    // A snapshot taken before the swap keeps the old view.
    assert!(before.config.components.is_empty());

    let after = EventContext::new(store.snapshot(), false);
    assert_eq!(
        pipeline.dispatcher().process_message(&bash_tag(), &after).label(),
        "synced"
    );
}

#[test]
fn test_invalid_replacement_is_rejected_by_loader() {
    let dir = assert_fs::TempDir::new().unwrap();
    let config = dir.child("distrobaker.yaml");
    config
        .write_str("configuration:\n  source:\n    scm: ''\n")
        .unwrap();

    let err = loader().load(&ConfigSource::Local(config.path().to_path_buf()));

    assert!(err.is_err());
}

#[test]
fn test_configuration_from_repository_drives_pipeline() {
    let forge = forge_with_bash();
    let yaml = forge.config_yaml(true, false, &[("bash", "rawhide", "c10s")]);
    let config_repo = forge.root().join("config.git");
    init_bare(&config_repo, "prod", &[("distrobaker.yaml", yaml.as_str())]);

    let source = ConfigSource::parse(&format!("{}#prod", config_repo.display()));
    assert!(matches!(source, ConfigSource::Repository(_)));

    let loaded = loader().load(&source).unwrap();
    let store = ConfigurationStore::new(loaded.config);
    let downstream = forge.downstream_path("rpms", "bash");
    let before = branch_head(&downstream, "c10s");

    let outcome = pipeline()
        .dispatcher()
        .process_message(&bash_tag(), &EventContext::new(store.snapshot(), false));

    assert_eq!(outcome.label(), "synced");
    assert_ne!(branch_head(&downstream, "c10s"), before);
}

#[test]
fn test_configuration_directory_source() {
    let forge = TestForge::new();
    forge.write_config(false, true, &[("bash", "c10s", "c10s")]);

    let loaded = loader()
        .load(&ConfigSource::parse(&forge.root().display().to_string()))
        .unwrap();

    assert!(!loaded.config.settings.control.merge);
    assert_eq!(loaded.config.components.len(), 1);
}
