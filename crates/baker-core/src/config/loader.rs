//! Loading configuration from a local path or a git repository

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use baker_fs::ConfigFile;
use baker_git::{ScmLocator, VcsClient};

use crate::retry::RetryPolicy;
use crate::{Error, Result};

use super::model::Configuration;
use super::validate::validate;

/// File name looked up inside configuration directories and repositories.
pub const CONFIG_FILE_NAME: &str = "distrobaker.yaml";

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file, or a directory containing [`CONFIG_FILE_NAME`].
    Local(PathBuf),
    /// A git repository holding [`CONFIG_FILE_NAME`] at its root.
    Repository(ScmLocator),
}

impl ConfigSource {
    /// Existing local paths win; anything else is treated as `url#ref`.
    pub fn parse(value: &str) -> Self {
        let path = Path::new(value);
        if path.exists() {
            Self::Local(path.to_path_buf())
        } else {
            Self::Repository(ScmLocator::parse(value))
        }
    }

    /// The local file backing this source, if any.
    pub fn local_file(&self) -> Option<PathBuf> {
        match self {
            Self::Local(path) if path.is_dir() => Some(path.join(CONFIG_FILE_NAME)),
            Self::Local(path) => Some(path.clone()),
            Self::Repository(_) => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Repository(locator) => write!(f, "{}", locator),
        }
    }
}

/// A validated configuration plus the warnings raised while loading it.
#[derive(Debug, Clone)]
pub struct LoadedConfiguration {
    pub config: Configuration,
    pub warnings: Vec<String>,
}

/// Fetches, parses and validates configuration documents.
pub struct ConfigLoader {
    vcs: Arc<dyn VcsClient>,
    retry: RetryPolicy,
}

impl ConfigLoader {
    pub fn new(vcs: Arc<dyn VcsClient>, retry: RetryPolicy) -> Self {
        Self { vcs, retry }
    }

    /// Load from `source`. Nothing is returned unless the whole document is
    /// valid.
    pub fn load(&self, source: &ConfigSource) -> Result<LoadedConfiguration> {
        match source {
            ConfigSource::Local(_) => {
                let file = source
                    .local_file()
                    .ok_or_else(|| Error::config("no local configuration file"))?;
                Self::load_file(&file)
            }
            ConfigSource::Repository(locator) => self.load_repository(locator),
        }
    }

    /// Parse and validate a single configuration file.
    pub fn load_file(path: &Path) -> Result<LoadedConfiguration> {
        if !path.is_file() {
            return Err(Error::config(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let config: Configuration = ConfigFile::load(path)
            .map_err(|e| Error::config(e.to_string()))?;
        let warnings = validate(&config)?;
        tracing::debug!(path = %path.display(), components = config.components.len(), "Configuration loaded");
        Ok(LoadedConfiguration { config, warnings })
    }

    fn load_repository(&self, locator: &ScmLocator) -> Result<LoadedConfiguration> {
        let workdir = tempfile::Builder::new().prefix("distrobaker-").tempdir()?;
        let checkout = workdir.path().join("config");
        tracing::info!(source = %locator, path = %checkout.display(), "Fetching configuration");

        self.retry.run("fetch configuration", |_| {
            remove_partial(&checkout)?;
            self.vcs.clone_branch(locator, &checkout)?;
            Ok(())
        })?;

        Self::load_file(&checkout.join(CONFIG_FILE_NAME))
    }
}

/// Remove leftovers of a failed clone attempt.
pub(crate) fn remove_partial(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baker_git::Git2Client;
    use baker_test_utils::forge::TestForge;
    use baker_test_utils::git::init_bare;

    fn loader() -> ConfigLoader {
        ConfigLoader::new(Arc::new(Git2Client::new()), RetryPolicy::default())
    }

    #[test]
    fn test_local_directory_resolves_config_file() {
        let forge = TestForge::new();
        forge.write_config(true, true, &[("bash", "f39", "f39")]);

        let source = ConfigSource::parse(&forge.root().to_string_lossy());
        assert_eq!(source.local_file(), Some(forge.root().join(CONFIG_FILE_NAME)));

        let loaded = loader().load(&source).unwrap();
        assert!(loaded.config.settings.control.merge);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_non_path_is_repository() {
        let source = ConfigSource::parse("https://example.org/config.git#prod");
        assert_eq!(
            source,
            ConfigSource::Repository(ScmLocator::new("https://example.org/config.git", "prod"))
        );
        assert_eq!(source.local_file(), None);
    }

    #[test]
    fn test_repository_source_is_cloned() {
        let forge = TestForge::new();
        let yaml = forge.config_yaml(false, true, &[("bash", "f39", "f39")]);
        let bare = forge.root().join("config-repo");
        init_bare(&bare, "prod", &[(CONFIG_FILE_NAME, yaml.as_str())]);

        let source = ConfigSource::parse(&format!("{}#prod", bare.display()));
        let loaded = loader().load(&source).unwrap();
        assert_eq!(loaded.config.components.len(), 1);
    }

    #[test]
    fn test_repository_without_config_file() {
        let forge = TestForge::new();
        let bare = forge.root().join("config-repo");
        init_bare(&bare, "master", &[("README", "nothing here")]);

        let source = ConfigSource::parse(&format!("{}#master", bare.display()));
        let err = loader().load(&source).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_invalid_document_rejected_whole() {
        let forge = TestForge::new();
        let yaml = forge
            .config_yaml(true, true, &[])
            .replace("    target: f39-candidate\n", "");
        let path = forge.root().join(CONFIG_FILE_NAME);
        std::fs::write(&path, yaml).unwrap();

        let err = ConfigLoader::load_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
