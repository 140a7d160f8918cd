//! BuildDispatcher implementation

use std::fmt;
use std::sync::Arc;

use crate::context::EventContext;
use crate::namespace::Namespace;
use crate::{Error, Result};

use super::{BuildRequest, BuildSystem};

/// Result of a build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The build system accepted the build as this task.
    Task(u64),
    /// Dry-run: authenticated, nothing submitted.
    DryRun,
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {}", id),
            Self::DryRun => f.write_str("dry-run"),
        }
    }
}

/// Submits builds of synchronized commits.
pub struct BuildDispatcher {
    system: Arc<dyn BuildSystem>,
}

impl BuildDispatcher {
    pub fn new(system: Arc<dyn BuildSystem>) -> Self {
        Self { system }
    }

    /// Build source locator: `<prefix>/<namespace>/<component>#<ref>`.
    pub fn source_locator(prefix: &str, namespace: Namespace, component: &str, reference: &str) -> String {
        format!("{}/{}/{}#{}", prefix, namespace, component, reference)
    }

    /// Request a build of `component` at `reference`.
    ///
    /// Only rpms are buildable. Failures are returned once and never retried.
    pub fn build_comp(
        &self,
        component: &str,
        reference: &str,
        namespace: Namespace,
        ctx: &EventContext,
    ) -> Result<Submission> {
        if namespace != Namespace::Rpms {
            tracing::error!(component, %namespace, "Builds are not implemented for this namespace");
            return Err(Error::UnsupportedNamespace {
                namespace: namespace.to_string(),
            });
        }

        let build = &ctx.config.settings.build;
        self.system.authenticate(&build.profile)?;

        let request = BuildRequest {
            source: Self::source_locator(&build.prefix, namespace, component, reference),
            target: build.target.clone(),
            scratch: build.scratch(),
        };

        if ctx.dry_run {
            tracing::info!(
                component,
                source = %request.source,
                target = %request.target,
                "Dry-run: skipping build submission"
            );
            return Ok(Submission::DryRun);
        }

        let task = self.system.submit(&build.profile, &request)?;
        tracing::info!(
            component,
            source = %request.source,
            target = %request.target,
            scratch = request.scratch,
            task,
            "Build submitted"
        );
        Ok(Submission::Task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::fakes::RecordingBuildSystem;
    use baker_test_utils::forge::TestForge;
    use pretty_assertions::assert_eq;

    fn context(dry_run: bool) -> EventContext {
        let forge = TestForge::new();
        let config: Configuration =
            serde_yaml::from_str(&forge.config_yaml(true, true, &[("bash", "f39", "f39")]))
                .unwrap();
        EventContext::new(Arc::new(config), dry_run)
    }

    #[test]
    fn test_submits_rpm_build() {
        let system = Arc::new(RecordingBuildSystem::new(1234));
        let dispatcher = BuildDispatcher::new(system.clone());

        let submission = dispatcher
            .build_comp("bash", "0a1b2c", Namespace::Rpms, &context(false))
            .unwrap();

        assert_eq!(submission, Submission::Task(1234));
        assert_eq!(system.authentications(), vec!["downstream".to_string()]);
        assert_eq!(
            system.submissions(),
            vec![BuildRequest {
                source: "git+https://downstream.invalid/rpms/bash#0a1b2c".into(),
                target: "f39-candidate".into(),
                scratch: true,
            }]
        );
    }

    #[test]
    fn test_dry_run_authenticates_without_submitting() {
        let system = Arc::new(RecordingBuildSystem::new(1));
        let dispatcher = BuildDispatcher::new(system.clone());

        let submission = dispatcher
            .build_comp("bash", "0a1b2c", Namespace::Rpms, &context(true))
            .unwrap();

        assert_eq!(submission, Submission::DryRun);
        assert_eq!(system.authentications().len(), 1);
        assert!(system.submissions().is_empty());
    }

    #[test]
    fn test_modules_unsupported() {
        let system = Arc::new(RecordingBuildSystem::new(1));
        let dispatcher = BuildDispatcher::new(system.clone());

        let err = dispatcher
            .build_comp("perl", "0a1b2c", Namespace::Modules, &context(false))
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedNamespace { .. }));
        assert!(system.authentications().is_empty());
    }

    #[test]
    fn test_authentication_failure_is_not_retried() {
        let system = Arc::new(RecordingBuildSystem::new(1).rejecting_credentials());
        let dispatcher = BuildDispatcher::new(system.clone());

        let err = dispatcher
            .build_comp("bash", "0a1b2c", Namespace::Rpms, &context(false))
            .unwrap_err();

        assert!(matches!(err, Error::Authentication { .. }));
        assert_eq!(system.authentications().len(), 1);
        assert!(system.submissions().is_empty());
    }
}
