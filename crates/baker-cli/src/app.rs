//! Shared state built from global flags

use std::sync::Arc;
use std::time::Duration;

use baker_core::{
    ConfigLoader, ConfigSource, Configuration, ConfigurationStore, EventContext, Pipeline,
    RetryPolicy,
};
use baker_git::Git2Client;
use colored::Colorize;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Global options every command shares.
#[derive(Debug, Clone)]
pub struct App {
    config: Option<String>,
    pub dry_run: bool,
    pub retry: RetryPolicy,
}

impl App {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            dry_run: cli.dry_run,
            retry: RetryPolicy::default().with_backoff(Duration::from_millis(cli.retry_backoff_ms)),
        }
    }

    pub fn config_source(&self) -> Result<ConfigSource> {
        self.config
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(ConfigSource::parse)
            .ok_or_else(|| {
                CliError::user("no configuration source, pass --config or set DISTROBAKER_CONFIG")
            })
    }

    pub fn loader(&self) -> ConfigLoader {
        ConfigLoader::new(Arc::new(Git2Client::new()), self.retry)
    }

    /// Load and validate configuration, printing its warnings.
    pub fn load_config(&self, source: &ConfigSource) -> Result<Configuration> {
        let loaded = self.loader().load(source)?;
        for warning in &loaded.warnings {
            eprintln!("{}: {}", "warning".yellow().bold(), warning);
        }
        Ok(loaded.config)
    }

    /// Load configuration into a fresh store.
    pub fn store(&self, source: &ConfigSource) -> Result<Arc<ConfigurationStore>> {
        Ok(Arc::new(ConfigurationStore::new(self.load_config(source)?)))
    }

    pub fn pipeline(&self) -> Result<Arc<Pipeline>> {
        Ok(Arc::new(Pipeline::production(self.retry)?))
    }

    /// Context for one event against the store's current configuration.
    pub fn context(&self, store: &ConfigurationStore) -> EventContext {
        EventContext::new(store.snapshot(), self.dry_run)
    }
}
