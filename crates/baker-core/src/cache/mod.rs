//! Lookaside cache synchronization
//!
//! - **manifest**: parsing of `sources` files into [`SourceRecord`]s
//! - **lookaside**: the [`LookasideCache`] client trait and its HTTP backend
//! - **sync**: [`CacheSynchronizer`], which copies missing files downstream

mod lookaside;
mod manifest;
mod sync;

pub use lookaside::{CacheKey, CgiLookaside, LookasideCache};
pub use manifest::{Manifest, SourceRecord};
pub use sync::{CacheSynchronizer, Transfer};
