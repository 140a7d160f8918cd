//! In-memory fakes for pipeline collaborators (testing only)
//!
//! Provides `MemoryLookaside`, `RecordingBuildSystem`, `ScriptedSync`,
//! `ScriptedBuild` and `FailingVcs`, which satisfy the collaborator traits
//! without network access and record how they were called.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use baker_git::{ScmLocator, VcsClient, Worktree};

use crate::build::{BuildRequest, BuildSystem, Submission};
use crate::cache::{CacheKey, LookasideCache};
use crate::config::CacheSettings;
use crate::context::EventContext;
use crate::namespace::Namespace;
use crate::trigger::{ComponentBuild, ComponentSync};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

// ---------------------------------------------------------------------------
// MemoryLookaside
// ---------------------------------------------------------------------------

type EntryKey = (String, String, String);

/// Lookaside caches held in memory, one per cache URL.
///
/// Entries are keyed by `(cache url, name, filename)`; the hash is carried in
/// requests but not part of the key.
#[derive(Debug, Default)]
pub struct MemoryLookaside {
    entries: Mutex<HashMap<EntryKey, Vec<u8>>>,
    exists_calls: AtomicUsize,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
    fail_next: AtomicUsize,
}

impl MemoryLookaside {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(cache: &CacheSettings, name: &str, filename: &str) -> EntryKey {
        (cache.url.clone(), name.to_string(), filename.to_string())
    }

    pub fn insert(&self, cache: &CacheSettings, name: &str, filename: &str, content: &[u8]) {
        lock(&self.entries).insert(Self::key(cache, name, filename), content.to_vec());
    }

    pub fn contains(&self, cache: &CacheSettings, name: &str, filename: &str) -> bool {
        lock(&self.entries).contains_key(&Self::key(cache, name, filename))
    }

    /// Make the next `count` operations fail with a transient error.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn exists_count(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn injected_failure(&self) -> Result<()> {
        let remaining = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match remaining {
            Ok(_) => Err(Error::Cache {
                message: "injected transient failure".to_string(),
            }),
            Err(_) => Ok(()),
        }
    }
}

impl LookasideCache for MemoryLookaside {
    fn exists(&self, cache: &CacheSettings, key: &CacheKey) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        Ok(self.contains(cache, &key.name, &key.filename))
    }

    fn download(&self, cache: &CacheSettings, key: &CacheKey, dest: &Path) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        let content = lock(&self.entries)
            .get(&Self::key(cache, &key.name, &key.filename))
            .cloned()
            .ok_or_else(|| Error::Cache {
                message: format!("{}/{} not found in {}", key.name, key.filename, cache.url),
            })?;
        baker_fs::io::write_atomic(dest, &content)?;
        Ok(())
    }

    fn upload(&self, cache: &CacheSettings, key: &CacheKey, file: &Path) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        let content = std::fs::read(file)?;
        self.insert(cache, &key.name, &key.filename, &content);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingBuildSystem
// ---------------------------------------------------------------------------

/// Build system that accepts every build as the same task id.
#[derive(Debug)]
pub struct RecordingBuildSystem {
    task_id: u64,
    reject_credentials: bool,
    authentications: Mutex<Vec<String>>,
    submissions: Mutex<Vec<BuildRequest>>,
}

impl RecordingBuildSystem {
    pub fn new(task_id: u64) -> Self {
        Self {
            task_id,
            reject_credentials: false,
            authentications: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Fail every authentication attempt.
    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    /// Profiles authenticated with, in call order.
    pub fn authentications(&self) -> Vec<String> {
        lock(&self.authentications).clone()
    }

    pub fn submissions(&self) -> Vec<BuildRequest> {
        lock(&self.submissions).clone()
    }
}

impl BuildSystem for RecordingBuildSystem {
    fn authenticate(&self, profile: &str) -> Result<()> {
        lock(&self.authentications).push(profile.to_string());
        if self.reject_credentials {
            return Err(Error::Authentication {
                profile: profile.to_string(),
                message: "Not authenticated".to_string(),
            });
        }
        Ok(())
    }

    fn submit(&self, _profile: &str, request: &BuildRequest) -> Result<u64> {
        lock(&self.submissions).push(request.clone());
        Ok(self.task_id)
    }
}

// ---------------------------------------------------------------------------
// ScriptedSync / ScriptedBuild
// ---------------------------------------------------------------------------

/// Sync step returning a fixed result.
#[derive(Debug)]
pub struct ScriptedSync {
    result: std::result::Result<String, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedSync {
    pub fn succeeding(commit: &str) -> Self {
        Self::with_result(Ok(commit.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(result: std::result::Result<String, String>) -> Self {
        Self {
            result,
            delay: None,
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `<namespace>/<component>` per call.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl ComponentSync for ScriptedSync {
    fn sync_component(&self, component: &str, namespace: Namespace, _ctx: &EventContext) -> Result<String> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        lock(&self.calls).push(format!("{}/{}", namespace, component));
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        self.result.clone().map_err(|message| Error::Cache { message })
    }
}

/// Build step returning a fixed result.
#[derive(Debug)]
pub struct ScriptedBuild {
    result: std::result::Result<u64, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBuild {
    pub fn succeeding(task_id: u64) -> Self {
        Self {
            result: Ok(task_id),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `<namespace>/<component>#<ref>` per call.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

impl ComponentBuild for ScriptedBuild {
    fn build_component(
        &self,
        component: &str,
        reference: &str,
        namespace: Namespace,
        _ctx: &EventContext,
    ) -> Result<Submission> {
        lock(&self.calls).push(format!("{}/{}#{}", namespace, component, reference));
        self.result
            .clone()
            .map(Submission::Task)
            .map_err(|message| Error::BuildSubmission { message })
    }
}

// ---------------------------------------------------------------------------
// FailingVcs
// ---------------------------------------------------------------------------

/// Version-control client whose clones always fail.
#[derive(Debug, Default)]
pub struct FailingVcs {
    attempts: AtomicU32,
}

impl FailingVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl VcsClient for FailingVcs {
    fn clone_branch(&self, locator: &ScmLocator, _into: &Path) -> baker_git::Result<Box<dyn Worktree>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(baker_git::Error::Git(git2::Error::from_str(&format!(
            "failed to connect to {}",
            locator.url
        ))))
    }
}
