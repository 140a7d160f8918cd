//! Listen command implementation
//!
//! Messages arrive as JSON lines. Each one is handed to a blocking worker;
//! a semaphore bounds how many run at once. With `--watch-config` the local
//! configuration file is checked before every message and, once in-flight
//! events have drained, a changed file replaces the active configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use baker_core::{ConfigLoader, ConfigurationStore, EventOutcome, Message, Pipeline};
use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::app::App;
use crate::commands::print_outcome;
use crate::error::{CliError, Result};

/// Process messages from `input`, or standard input, until end of stream or
/// Ctrl-C.
pub fn run_listen(app: &App, input: Option<&Path>, workers: usize, watch_config: bool) -> Result<()> {
    let source = app.config_source()?;
    let store = app.store(&source)?;
    let pipeline = app.pipeline()?;

    let watch = match (watch_config, source.local_file()) {
        (false, _) => None,
        (true, Some(path)) => Some(ConfigWatch::new(path)?),
        (true, None) => {
            tracing::warn!(source = %source, "Only local configuration can be watched, ignoring --watch-config");
            None
        }
    };

    let workers = workers.max(1);
    tracing::info!(workers, dry_run = app.dry_run, "Listening for tag events");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(async {
        let listener = Listener {
            app: app.clone(),
            store,
            pipeline,
            permits: Arc::new(Semaphore::new(workers)),
            watch,
            tasks: JoinSet::new(),
            summary: ListenSummary::default(),
        };
        match input {
            Some(path) => {
                let file = tokio::fs::File::open(path).await?;
                listener.run(BufReader::new(file)).await
            }
            None => listener.run(BufReader::new(tokio::io::stdin())).await,
        }
    });
    // A pending stdin read would otherwise block runtime shutdown.
    runtime.shutdown_background();

    summary?.print();
    Ok(())
}

/// Counts of how events ended.
#[derive(Debug, Default)]
struct ListenSummary {
    outcomes: BTreeMap<&'static str, usize>,
    malformed: usize,
    panicked: usize,
    reloads: usize,
}

impl ListenSummary {
    fn record(&mut self, outcome: &EventOutcome) {
        *self.outcomes.entry(outcome.label()).or_default() += 1;
    }

    fn total(&self) -> usize {
        self.outcomes.values().sum::<usize>() + self.malformed + self.panicked
    }

    #[cfg(test)]
    fn count(&self, label: &str) -> usize {
        self.outcomes.get(label).copied().unwrap_or(0)
    }

    fn print(&self) {
        let mut parts: Vec<String> = self
            .outcomes
            .iter()
            .map(|(label, count)| format!("{} {}", count, label))
            .collect();
        if self.malformed > 0 {
            parts.push(format!("{} malformed", self.malformed));
        }
        if self.panicked > 0 {
            parts.push(format!("{} panicked", self.panicked));
        }

        println!();
        print!("{} {} event(s)", "Processed".green().bold(), self.total());
        if !parts.is_empty() {
            print!(": {}", parts.join(", "));
        }
        println!();
        if self.reloads > 0 {
            println!("{}", format!("Configuration reloaded {} time(s)", self.reloads).dimmed());
        }
    }
}

/// A local configuration file and the checksum last loaded from it.
struct ConfigWatch {
    path: PathBuf,
    checksum: String,
}

impl ConfigWatch {
    fn new(path: PathBuf) -> Result<Self> {
        let checksum = baker_fs::checksum::compute_file_checksum(&path)?;
        Ok(Self { path, checksum })
    }

    /// Whether the file differs from the last recorded checksum. The new
    /// checksum is recorded either way.
    fn changed(&mut self) -> bool {
        match baker_fs::checksum::compute_file_checksum(&self.path) {
            Ok(checksum) if checksum != self.checksum => {
                self.checksum = checksum;
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot read watched configuration");
                false
            }
        }
    }
}

struct Listener {
    app: App,
    store: Arc<ConfigurationStore>,
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
    watch: Option<ConfigWatch>,
    tasks: JoinSet<EventOutcome>,
    summary: ListenSummary,
}

impl Listener {
    async fn run<R>(mut self, reader: R) -> Result<ListenSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                _ = &mut shutdown => {
                    tracing::warn!("Interrupted, waiting for in-flight events");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            self.reap();
            self.reload_if_changed().await;

            match Message::from_json(line) {
                Ok(message) => self.dispatch(message).await?,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed message");
                    self.summary.malformed += 1;
                }
            }
        }

        self.drain().await;
        Ok(self.summary)
    }

    async fn dispatch(&mut self, message: Message) -> Result<()> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| CliError::user("worker pool closed"))?;
        let pipeline = Arc::clone(&self.pipeline);
        let ctx = self.app.context(&self.store);

        self.tasks.spawn_blocking(move || {
            let _permit = permit;
            pipeline.dispatcher().process_message(&message, &ctx)
        });
        Ok(())
    }

    /// Swap in a changed configuration once nothing is in flight. An invalid
    /// document leaves the current configuration active.
    async fn reload_if_changed(&mut self) {
        let Some(watch) = self.watch.as_mut() else {
            return;
        };
        if !watch.changed() {
            return;
        }
        let path = watch.path.clone();

        tracing::info!(path = %path.display(), "Configuration changed, draining in-flight events");
        self.drain().await;

        match ConfigLoader::load_file(&path) {
            Ok(loaded) => {
                for warning in &loaded.warnings {
                    tracing::warn!(warning = %warning, "Configuration warning");
                }
                let generation = self.store.replace(loaded.config);
                self.summary.reloads += 1;
                tracing::info!(generation, "Configuration reloaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Keeping previous configuration");
            }
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.finish(joined);
        }
    }

    async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.finish(joined);
        }
    }

    fn finish(&mut self, joined: std::result::Result<EventOutcome, JoinError>) {
        match joined {
            Ok(outcome) => {
                print_outcome(&outcome);
                self.summary.record(&outcome);
            }
            Err(e) if e.is_panic() => {
                tracing::error!(error = %e, "Event worker panicked");
                self.summary.panicked += 1;
            }
            Err(e) => tracing::warn!(error = %e, "Event worker cancelled"),
        }
    }
}
