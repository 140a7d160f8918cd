//! Lookaside cache client
//!
//! Dist-git lookaside caches serve large source files by
//! `(name, filename, hash, hashtype)` and accept uploads through a CGI
//! endpoint that also answers existence queries.

use std::path::Path;
use std::time::Duration;

use baker_fs::HashAlgorithm;
use reqwest::blocking::{Client, multipart::Form};

use crate::config::CacheSettings;
use crate::{Error, Result};

/// Address of one file in a lookaside cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// `<namespace>/<component>`
    pub name: String,
    pub filename: String,
    pub hash: String,
    pub algorithm: HashAlgorithm,
}

impl CacheKey {
    pub fn new(name: impl Into<String>, filename: impl Into<String>, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        Self {
            name: name.into(),
            filename: filename.into(),
            algorithm: HashAlgorithm::infer(&hash),
            hash,
        }
    }

    /// Expand a download path template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("%(name)s", &self.name)
            .replace("%(filename)s", &self.filename)
            .replace("%(hashtype)s", self.algorithm.as_str())
            .replace("%(hash)s", &self.hash)
    }

    /// Form field carrying the digest, e.g. `md5sum`.
    fn sum_field(&self) -> String {
        format!("{}sum", self.algorithm)
    }
}

/// Operations on a lookaside cache, addressed by its endpoint settings.
pub trait LookasideCache: Send + Sync {
    /// Whether the cache already holds `key`.
    fn exists(&self, cache: &CacheSettings, key: &CacheKey) -> Result<bool>;

    /// Download `key` to `dest`. `dest` only appears once fully written.
    fn download(&self, cache: &CacheSettings, key: &CacheKey, dest: &Path) -> Result<()>;

    /// Upload the file at `file` as `key`.
    fn upload(&self, cache: &CacheSettings, key: &CacheKey, file: &Path) -> Result<()>;
}

/// Response body of the CGI existence check.
const AVAILABLE: &str = "Available";
const MISSING: &str = "Missing";

/// [`LookasideCache`] speaking the dist-git upload CGI protocol over HTTP.
#[derive(Debug, Clone)]
pub struct CgiLookaside {
    client: Client,
}

impl CgiLookaside {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("distrobaker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    /// Full download URL for `key`.
    pub fn download_url(cache: &CacheSettings, key: &CacheKey) -> String {
        format!(
            "{}/{}",
            cache.url.trim_end_matches('/'),
            key.expand(&cache.path)
        )
    }
}

impl LookasideCache for CgiLookaside {
    fn exists(&self, cache: &CacheSettings, key: &CacheKey) -> Result<bool> {
        let form = Form::new()
            .text("name", key.name.clone())
            .text("filename", key.filename.clone())
            .text(key.sum_field(), key.hash.clone());

        let body = self
            .client
            .post(&cache.cgi)
            .multipart(form)
            .send()?
            .error_for_status()?
            .text()?;

        match body.trim() {
            AVAILABLE => Ok(true),
            MISSING => Ok(false),
            other => Err(Error::Cache {
                message: format!("unexpected existence response from {}: {}", cache.cgi, other),
            }),
        }
    }

    fn download(&self, cache: &CacheSettings, key: &CacheKey, dest: &Path) -> Result<()> {
        let url = Self::download_url(cache, key);
        tracing::debug!(url = %url, dest = %dest.display(), "Downloading");

        let mut response = self.client.get(&url).send()?.error_for_status()?;
        let bytes = baker_fs::io::write_atomic_from(dest, &mut response)?;
        tracing::debug!(filename = %key.filename, bytes, "Download complete");
        Ok(())
    }

    fn upload(&self, cache: &CacheSettings, key: &CacheKey, file: &Path) -> Result<()> {
        let form = Form::new()
            .text("name", key.name.clone())
            .text(key.sum_field(), key.hash.clone())
            .file("file", file)?;

        self.client
            .post(&cache.cgi)
            .multipart(form)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}
