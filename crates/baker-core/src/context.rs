//! Per-event execution context

use std::sync::Arc;

use crate::config::Configuration;

/// Everything one event's pipeline needs besides its collaborators.
///
/// The configuration is a snapshot taken when the event started; replacing
/// the store's configuration mid-event has no effect on it.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub config: Arc<Configuration>,
    /// Validate and authenticate but do not push, upload or submit.
    pub dry_run: bool,
}

impl EventContext {
    pub fn new(config: Arc<Configuration>, dry_run: bool) -> Self {
        Self { config, dry_run }
    }
}
