//! Version-control abstraction for DistroBaker
//!
//! The reconciliation pipeline talks to repositories only through the
//! [`VcsClient`] and [`Worktree`] traits, so the algorithm stays independent of
//! the backend. [`Git2Client`] is the libgit2-backed implementation.

pub mod backend;
pub mod client;
pub mod error;
pub mod locator;
pub mod naming;

pub use backend::Git2Client;
pub use client::{FastForward, Identity, PushMode, VcsClient, Worktree};
pub use error::{Error, Result};
pub use locator::ScmLocator;
