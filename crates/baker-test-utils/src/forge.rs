//! Paired upstream/downstream dist-git trees in a temporary directory.
//!
//! Repositories are laid out the way the configuration addresses them:
//! `<root>/upstream/<namespace>/<component>` and
//! `<root>/downstream/<namespace>/<component>`, all bare.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::git;

/// Default rpms trigger written by [`TestForge::config_yaml`].
pub const RPMS_TRIGGER: &str = "f39-updates-candidate";
/// Default modules trigger written by [`TestForge::config_yaml`].
pub const MODULES_TRIGGER: &str = "f39-modular-updates-candidate";
/// Commit message template written by [`TestForge::config_yaml`].
pub const SYNC_MESSAGE: &str = "Sync from upstream";
pub const SYNC_AUTHOR: &str = "DistroBaker";
pub const SYNC_EMAIL: &str = "distrobaker@example.org";

/// A temporary pair of upstream and downstream SCM roots.
///
/// The directory is removed when the forge is dropped.
pub struct TestForge {
    temp_dir: TempDir,
}

impl TestForge {
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new()
            .unwrap_or_else(|e| panic!("TestForge::new: failed to create temp dir: {e}"));
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// SCM base URL of the upstream side.
    pub fn upstream_scm(&self) -> String {
        self.root().join("upstream").to_string_lossy().into_owned()
    }

    /// SCM base URL of the downstream side.
    pub fn downstream_scm(&self) -> String {
        self.root().join("downstream").to_string_lossy().into_owned()
    }

    pub fn upstream_path(&self, namespace: &str, component: &str) -> PathBuf {
        self.root().join("upstream").join(namespace).join(component)
    }

    pub fn downstream_path(&self, namespace: &str, component: &str) -> PathBuf {
        self.root().join("downstream").join(namespace).join(component)
    }

    /// Create the upstream repository with one commit of `files` on `branch`.
    /// Returns the commit id.
    pub fn create_upstream(
        &self,
        namespace: &str,
        component: &str,
        branch: &str,
        files: &[(&str, &str)],
    ) -> String {
        git::init_bare(&self.upstream_path(namespace, component), branch, files)
    }

    /// Create the downstream repository as a bare clone of upstream, so both
    /// sides share history.
    pub fn mirror_downstream(&self, namespace: &str, component: &str) -> PathBuf {
        git::mirror_bare(
            &self.upstream_path(namespace, component),
            &self.downstream_path(namespace, component),
        )
    }

    /// Create the downstream repository with its own unrelated history.
    /// Returns the commit id.
    pub fn create_downstream(
        &self,
        namespace: &str,
        component: &str,
        branch: &str,
        files: &[(&str, &str)],
    ) -> String {
        git::init_bare(&self.downstream_path(namespace, component), branch, files)
    }

    /// Configuration document registering `components` (name, source
    /// branch, destination branch) in the rpms namespace.
    pub fn config_yaml(&self, merge: bool, build: bool, components: &[(&str, &str, &str)]) -> String {
        let mut yaml = format!(
            "configuration:
  source:
    scm: {upstream}
    cache:
      url: http://upstream.invalid/repo/pkgs
      cgi: http://upstream.invalid/repo/pkgs/upload.cgi
      path: \"%(name)s/%(filename)s/%(hashtype)s/%(hash)s/%(filename)s\"
  destination:
    scm: {downstream}
    cache:
      url: http://downstream.invalid/repo
      cgi: http://downstream.invalid/lookaside/upload.cgi
      path: \"%(name)s/%(filename)s/%(hashtype)s/%(hash)s/%(filename)s\"
  trigger:
    rpms: {RPMS_TRIGGER}
    modules: {MODULES_TRIGGER}
  build:
    profile: downstream
    prefix: git+https://downstream.invalid
    target: f39-candidate
    mbs: https://mbs.invalid
    scratch: true
  git:
    author: {SYNC_AUTHOR}
    email: {SYNC_EMAIL}
    message: {SYNC_MESSAGE}
  control:
    build: {build}
    merge: {merge}
components:
",
            upstream = self.upstream_scm(),
            downstream = self.downstream_scm(),
        );
        if components.is_empty() {
            yaml.push_str("  rpms: {}\n");
            return yaml;
        }
        yaml.push_str("  rpms:\n");
        for (name, source, destination) in components {
            yaml.push_str(&format!(
                "    {name}:\n      source: {name}#{source}\n      destination: {name}#{destination}\n"
            ));
        }
        yaml
    }

    /// Write [`config_yaml`](Self::config_yaml) to `distrobaker.yaml` under
    /// the forge root and return its path.
    pub fn write_config(&self, merge: bool, build: bool, components: &[(&str, &str, &str)]) -> PathBuf {
        let path = self.root().join("distrobaker.yaml");
        fs::write(&path, self.config_yaml(merge, build, components))
            .unwrap_or_else(|e| panic!("TestForge::write_config: failed to write {path:?}: {e}"));
        path
    }
}

impl Default for TestForge {
    fn default() -> Self {
        Self::new()
    }
}
