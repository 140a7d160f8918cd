//! DistroBaker CLI
//!
//! Keeps downstream dist-git repositories and lookaside caches in sync with
//! their upstream counterparts and requests builds of the result.

mod app;
mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use app::App;
use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    tracing::debug!(dry_run = cli.dry_run, "Starting distrobaker");

    let app = App::from_cli(&cli);
    match cli.command {
        Commands::Listen {
            input,
            workers,
            watch_config,
        } => commands::run_listen(&app, input.as_deref(), workers, watch_config),
        Commands::Sync {
            components,
            namespace,
            build,
        } => commands::run_sync(&app, &components, namespace, build),
        Commands::Check => commands::run_check(&app),
        Commands::Sources { file } => commands::run_sources(&file),
    }
}
