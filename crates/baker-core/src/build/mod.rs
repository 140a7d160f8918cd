//! Build submission
//!
//! [`BuildDispatcher`] turns a synchronized commit into a build request and
//! hands it to a [`BuildSystem`]. [`KojiCli`] is the production backend.

mod dispatcher;
mod koji;

pub use dispatcher::{BuildDispatcher, Submission};
pub use koji::{KojiCli, parse_task_id};

use crate::Result;

/// A build to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// `<prefix>/<namespace>/<component>#<ref>`
    pub source: String,
    pub target: String,
    pub scratch: bool,
}

/// Client of the downstream build system.
pub trait BuildSystem: Send + Sync {
    /// Verify that `profile` has working credentials.
    fn authenticate(&self, profile: &str) -> Result<()>;

    /// Submit `request` and return the task id.
    fn submit(&self, profile: &str, request: &BuildRequest) -> Result<u64>;
}
