//! Terminal states of event processing

use std::fmt;

use crate::build::Submission;
use crate::namespace::Namespace;

/// Where one event's processing ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not a tag event, or no matching trigger/component.
    Ignored { reason: String },
    /// The tag matched a namespace whose pipeline does not exist.
    NotImplemented { namespace: Namespace },
    /// Synchronized; builds are disabled.
    Synced { component: String, commit: String },
    /// Synchronized and a build was requested.
    Built {
        component: String,
        commit: String,
        submission: Submission,
    },
    SyncFailed { component: String, error: String },
    BuildFailed {
        component: String,
        commit: String,
        error: String,
    },
}

impl EventOutcome {
    pub(crate) fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SyncFailed { .. } | Self::BuildFailed { .. })
    }

    /// Short state name for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored { .. } => "ignored",
            Self::NotImplemented { .. } => "not-implemented",
            Self::Synced { .. } => "synced",
            Self::Built { .. } => "built",
            Self::SyncFailed { .. } => "sync-failed",
            Self::BuildFailed { .. } => "build-failed",
        }
    }
}

impl fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored { reason } => write!(f, "ignored: {}", reason),
            Self::NotImplemented { namespace } => {
                write!(f, "{} pipeline not implemented", namespace)
            }
            Self::Synced { component, commit } => write!(f, "{} synced at {}", component, commit),
            Self::Built {
                component,
                commit,
                submission,
            } => write!(f, "{} synced at {}, build {}", component, commit, submission),
            Self::SyncFailed { component, error } => {
                write!(f, "{} sync failed: {}", component, error)
            }
            Self::BuildFailed {
                component,
                commit,
                error,
            } => write!(f, "{} synced at {}, build failed: {}", component, commit, error),
        }
    }
}
