//! TriggerDispatcher implementation
//!
//! Each event moves through `Matching -> (Syncing -> Building | Ignored)`.
//! Failures end the event with a failure outcome and never escape it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::build::{BuildDispatcher, Submission};
use crate::context::EventContext;
use crate::namespace::Namespace;
use crate::sync::RepoSynchronizer;
use crate::Result;

use super::message::{Message, TagEvent};
use super::outcome::EventOutcome;

/// The synchronization step of the pipeline.
pub trait ComponentSync: Send + Sync {
    /// Synchronize `component` and return the resulting commit id.
    fn sync_component(&self, component: &str, namespace: Namespace, ctx: &EventContext) -> Result<String>;
}

/// The build step of the pipeline.
pub trait ComponentBuild: Send + Sync {
    fn build_component(
        &self,
        component: &str,
        reference: &str,
        namespace: Namespace,
        ctx: &EventContext,
    ) -> Result<Submission>;
}

impl ComponentSync for RepoSynchronizer {
    fn sync_component(&self, component: &str, namespace: Namespace, ctx: &EventContext) -> Result<String> {
        self.sync_repo(component, namespace, ctx)
    }
}

impl ComponentBuild for BuildDispatcher {
    fn build_component(
        &self,
        component: &str,
        reference: &str,
        namespace: Namespace,
        ctx: &EventContext,
    ) -> Result<Submission> {
        self.build_comp(component, reference, namespace, ctx)
    }
}

/// Routes tag events to the sync and build steps.
///
/// Safe to share between worker threads. Events for the same component are
/// serialized; events for different components run independently.
pub struct TriggerDispatcher {
    sync: Arc<dyn ComponentSync>,
    build: Arc<dyn ComponentBuild>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TriggerDispatcher {
    pub fn new(sync: Arc<dyn ComponentSync>, build: Arc<dyn ComponentBuild>) -> Self {
        Self {
            sync,
            build,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one bus message.
    pub fn process_message(&self, message: &Message, ctx: &EventContext) -> EventOutcome {
        if !message.is_tag_event() {
            tracing::warn!(topic = %message.topic, "Ignoring message with unexpected topic");
            return EventOutcome::ignored(format!("topic {} is not a tag event", message.topic));
        }
        match TagEvent::from_message(message) {
            Ok(event) => self.process_tag(&event, ctx),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed tag event");
                EventOutcome::ignored(e.to_string())
            }
        }
    }

    /// Handle one tag event.
    pub fn process_tag(&self, event: &TagEvent, ctx: &EventContext) -> EventOutcome {
        let config = &ctx.config;
        match config.settings.trigger.namespace_for_tag(&event.tag) {
            Some(Namespace::Rpms) => {
                if config.component(Namespace::Rpms, &event.component).is_none() {
                    tracing::debug!(component = %event.component, "RPM component not configured, ignoring");
                    return EventOutcome::ignored(format!(
                        "rpms/{} is not configured",
                        event.component
                    ));
                }
                tracing::info!(component = %event.component, tag = %event.tag, "Processing RPM tag event");
                self.run_component(
                    &event.component,
                    Namespace::Rpms,
                    config.settings.control.build,
                    ctx,
                )
            }
            Some(Namespace::Modules) => {
                tracing::error!(component = %event.component, "Module tag events are not implemented");
                EventOutcome::NotImplemented {
                    namespace: Namespace::Modules,
                }
            }
            None => {
                tracing::debug!(component = %event.component, tag = %event.tag, "Tag does not match a trigger");
                EventOutcome::ignored(format!("tag {} matches no trigger", event.tag))
            }
        }
    }

    /// Synchronize `component` and, when `build` is set and the sync
    /// succeeded, request a build of the result.
    pub fn run_component(
        &self,
        component: &str,
        namespace: Namespace,
        build: bool,
        ctx: &EventContext,
    ) -> EventOutcome {
        let lock = self.component_lock(namespace, component);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        let commit = match self.sync.sync_component(component, namespace, ctx) {
            Ok(commit) => commit,
            Err(e) => {
                tracing::error!(component, %namespace, error = %e, "Synchronization failed");
                return EventOutcome::SyncFailed {
                    component: component.to_string(),
                    error: e.to_string(),
                };
            }
        };

        if !build {
            tracing::info!(component, commit = %commit, "Builds disabled, event complete");
            return EventOutcome::Synced {
                component: component.to_string(),
                commit,
            };
        }

        match self.build.build_component(component, &commit, namespace, ctx) {
            Ok(submission) => EventOutcome::Built {
                component: component.to_string(),
                commit,
                submission,
            },
            Err(e) => {
                tracing::error!(component, %namespace, error = %e, "Build request failed");
                EventOutcome::BuildFailed {
                    component: component.to_string(),
                    commit,
                    error: e.to_string(),
                }
            }
        }
    }

    fn component_lock(&self, namespace: Namespace, component: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        Arc::clone(
            locks
                .entry(format!("{}/{}", namespace, component))
                .or_default(),
        )
    }
}
