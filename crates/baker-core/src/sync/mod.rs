//! Repository synchronization
//!
//! [`RepoSynchronizer`] clones the downstream branch, fetches upstream,
//! reconciles the two with one of two strategies, synchronizes the lookaside
//! cache when a `sources` manifest is present and pushes the result.
//!
//! - **merge-preserving** (`control.merge: true`): one squash commit per run
//!   makes the downstream tree equal to upstream
//! - **fast-forward only** (`control.merge: false`): diverged histories fail

mod repo;

pub use repo::{DESTINATION_REMOTE, MANIFEST_FILE, RepoSynchronizer, SOURCE_REMOTE};
