//! Synchronization and build-trigger pipeline for DistroBaker
//!
//! This crate implements the pipeline that keeps downstream dist-git
//! repositories and lookaside caches in step with upstream and requests
//! downstream builds:
//!
//! - **Configuration**: validated, immutable snapshots with atomic replacement
//! - **CacheSynchronizer**: copies `sources` files between lookaside caches
//! - **RepoSynchronizer**: reconciles a downstream branch with upstream
//! - **BuildDispatcher**: submits builds of synchronized commits
//! - **TriggerDispatcher**: routes tag events through sync and build
//!
//! # Architecture
//!
//! ```text
//!                 TriggerDispatcher
//!                   |           |
//!        RepoSynchronizer   BuildDispatcher
//!          |        |              |
//!     baker-git  CacheSynchronizer BuildSystem (koji)
//!                   |
//!              LookasideCache (HTTP)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use baker_core::{EventContext, Message, Pipeline, RetryPolicy};
//!
//! let pipeline = Pipeline::production(RetryPolicy::default())?;
//! let ctx = EventContext::new(store.snapshot(), false);
//! let outcome = pipeline.dispatcher().process_message(&message, &ctx);
//! ```

pub mod build;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod fakes;
pub mod namespace;
pub mod pipeline;
pub mod retry;
pub mod sync;
pub mod trigger;

pub use build::{BuildDispatcher, BuildRequest, BuildSystem, KojiCli, Submission};
pub use cache::{CacheKey, CacheSynchronizer, CgiLookaside, LookasideCache, Manifest, SourceRecord};
pub use config::{ConfigLoader, ConfigSource, Configuration, ConfigurationStore};
pub use context::EventContext;
pub use error::{Error, Result};
pub use namespace::Namespace;
pub use pipeline::Pipeline;
pub use retry::RetryPolicy;
pub use sync::RepoSynchronizer;
pub use trigger::{EventOutcome, Message, TagEvent, TriggerDispatcher};
