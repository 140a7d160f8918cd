//! Filesystem layer for DistroBaker
//!
//! Provides atomic file writes, format-aware configuration loading and the
//! checksum algorithms used by lookaside cache manifests.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;

pub use checksum::HashAlgorithm;
pub use config::ConfigFile;
pub use error::{Error, Result};
