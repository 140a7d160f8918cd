//! Wiring of pipeline components

use std::sync::Arc;

use baker_git::{Git2Client, VcsClient};

use crate::Result;
use crate::build::{BuildDispatcher, BuildSystem, KojiCli};
use crate::cache::{CacheSynchronizer, CgiLookaside, LookasideCache};
use crate::retry::RetryPolicy;
use crate::sync::RepoSynchronizer;
use crate::trigger::TriggerDispatcher;

/// The assembled sync and build pipeline.
pub struct Pipeline {
    dispatcher: TriggerDispatcher,
}

impl Pipeline {
    pub fn new(
        vcs: Arc<dyn VcsClient>,
        lookaside: Arc<dyn LookasideCache>,
        build_system: Arc<dyn BuildSystem>,
        retry: RetryPolicy,
    ) -> Self {
        let cache = CacheSynchronizer::new(lookaside, retry);
        let repo_sync = Arc::new(RepoSynchronizer::new(vcs, cache, retry));
        let builds = Arc::new(BuildDispatcher::new(build_system));
        Self {
            dispatcher: TriggerDispatcher::new(repo_sync, builds),
        }
    }

    /// libgit2, the HTTP lookaside client and the `koji` CLI.
    pub fn production(retry: RetryPolicy) -> Result<Self> {
        Ok(Self::new(
            Arc::new(Git2Client::new()),
            Arc::new(CgiLookaside::new()?),
            Arc::new(KojiCli::default()),
            retry,
        ))
    }

    pub fn dispatcher(&self) -> &TriggerDispatcher {
        &self.dispatcher
    }
}
