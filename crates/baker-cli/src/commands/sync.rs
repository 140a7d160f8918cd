//! Sync command implementation

use baker_core::Namespace;
use colored::Colorize;

use crate::app::App;
use crate::commands::print_outcome;
use crate::error::{CliError, Result};

/// Synchronize `components` one after another, building each when `build`
/// is set.
///
/// Every component is attempted; the command fails afterwards if any of
/// them did.
pub fn run_sync(app: &App, components: &[String], namespace: Namespace, build: bool) -> Result<()> {
    let source = app.config_source()?;
    let store = app.store(&source)?;
    let pipeline = app.pipeline()?;
    let ctx = app.context(&store);

    if app.dry_run {
        println!("{}", "Dry run, nothing will be pushed or built".yellow());
    }

    let mut failed = 0;
    for component in components {
        tracing::info!(component = %component, %namespace, build, "Synchronizing component");
        let outcome = pipeline
            .dispatcher()
            .run_component(component, namespace, build, &ctx);
        print_outcome(&outcome);
        if outcome.is_failure() {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CliError::user(format!(
            "{} of {} component(s) failed",
            failed,
            components.len()
        )));
    }
    Ok(())
}
