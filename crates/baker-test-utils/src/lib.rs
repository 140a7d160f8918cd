//! Shared test utilities for the distrobaker workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`git`] — bare repository fixtures driven through the `git` CLI
//! - [`forge`] — [`TestForge`](forge::TestForge) with paired upstream and
//!   downstream dist-git trees plus a matching configuration document

pub mod forge;
pub mod git;
