//! CLI argument parsing using clap derive

use std::path::PathBuf;

use baker_core::Namespace;
use clap::{Parser, Subcommand};

/// DistroBaker - sync dist-git repositories downstream and build them
#[derive(Parser, Debug)]
#[command(name = "distrobaker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration source: a file, a directory, or a git `url#ref`
    #[arg(short, long, global = true, env = "DISTROBAKER_CONFIG")]
    pub config: Option<String>,

    /// Validate and authenticate, but never push, upload or submit builds
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Initial delay between retries in milliseconds (0 retries immediately)
    #[arg(long, global = true, default_value_t = 0)]
    pub retry_backoff_ms: u64,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Process tag events read as JSON lines
    ///
    /// Each line is a message of the form
    /// `{"topic": "...buildsys.tag", "body": {"name": "bash", "tag": "..."}}`.
    Listen {
        /// Read messages from this file instead of standard input
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of events processed concurrently
        #[arg(short, long, default_value_t = 1)]
        workers: usize,

        /// Reload a local configuration file when it changes
        #[arg(long)]
        watch_config: bool,
    },

    /// Synchronize the named components now, without waiting for a tag
    Sync {
        /// Components to synchronize
        #[arg(required = true)]
        components: Vec<String>,

        /// Namespace the components live in
        #[arg(short, long, default_value = "rpms")]
        namespace: Namespace,

        /// Request a build after each successful sync
        #[arg(short, long)]
        build: bool,
    },

    /// Load and validate the configuration
    Check,

    /// Print the records of a `sources` manifest
    Sources {
        /// Path to the manifest
        file: PathBuf,
    },
}
