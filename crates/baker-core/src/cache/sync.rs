//! Transfer of lookaside cache files between upstream and downstream

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use baker_git::naming::temp_prefix;

use crate::context::EventContext;
use crate::namespace::Namespace;
use crate::retry::RetryPolicy;
use crate::Result;

use super::lookaside::{CacheKey, LookasideCache};
use super::manifest::Manifest;

/// What happened to one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Downstream already had the file.
    Present,
    /// Downloaded and uploaded.
    Uploaded,
    /// Downloaded and verified; upload skipped for dry-run.
    Simulated,
}

/// Copies the files a `sources` manifest references from the upstream
/// lookaside cache to the downstream one.
pub struct CacheSynchronizer {
    lookaside: Arc<dyn LookasideCache>,
    retry: RetryPolicy,
}

impl CacheSynchronizer {
    pub fn new(lookaside: Arc<dyn LookasideCache>, retry: RetryPolicy) -> Self {
        Self { lookaside, retry }
    }

    /// Synchronize every file listed in `manifest_path`.
    ///
    /// Returns the filename to hash mapping of the manifest. Any file whose
    /// transfer fails on every attempt aborts the whole synchronization.
    pub fn sync_cache(
        &self,
        component: &str,
        namespace: Namespace,
        manifest_path: &Path,
        ctx: &EventContext,
    ) -> Result<BTreeMap<String, String>> {
        let manifest = Manifest::load(manifest_path)?;
        let entries = manifest.entries();
        let name = format!("{}/{}", namespace, component);

        tracing::info!(
            component,
            %namespace,
            files = entries.len(),
            dry_run = ctx.dry_run,
            "Synchronizing lookaside cache"
        );

        let scratch = tempfile::Builder::new()
            .prefix(&temp_prefix("cache", namespace.as_str(), component))
            .tempdir()?;

        for (filename, hash) in &entries {
            let key = CacheKey::new(name.clone(), filename.clone(), hash.clone());
            let operation = format!("transfer {}", filename);
            let outcome = self
                .retry
                .run(&operation, |_| self.transfer(&key, scratch.path(), ctx))?;
            tracing::debug!(component, filename = %filename, ?outcome, "Cache entry synchronized");
        }

        tracing::info!(component, %namespace, "Lookaside cache synchronized");
        Ok(entries)
    }

    fn transfer(&self, key: &CacheKey, scratch: &Path, ctx: &EventContext) -> Result<Transfer> {
        let settings = &ctx.config.settings;
        if self.lookaside.exists(&settings.destination.cache, key)? {
            return Ok(Transfer::Present);
        }

        // Manifest filenames are single path components, see `Manifest::parse`.
        let local = scratch.join(&key.filename);
        self.lookaside
            .download(&settings.source.cache, key, &local)?;
        baker_fs::checksum::verify_file(&local, &key.hash)?;

        if ctx.dry_run {
            tracing::info!(filename = %key.filename, "Dry-run: skipping upload");
            return Ok(Transfer::Simulated);
        }

        self.lookaside
            .upload(&settings.destination.cache, key, &local)?;
        Ok(Transfer::Uploaded)
    }
}
