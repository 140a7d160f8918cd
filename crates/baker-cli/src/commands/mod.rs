//! Command implementations

pub mod check;
pub mod listen;
pub mod sources;
pub mod sync;

use baker_core::EventOutcome;
use colored::Colorize;

pub use check::run_check;
pub use listen::run_listen;
pub use sources::run_sources;
pub use sync::run_sync;

/// One line per finished event.
pub(crate) fn print_outcome(outcome: &EventOutcome) {
    let label = match outcome {
        EventOutcome::Built { .. } | EventOutcome::Synced { .. } => outcome.label().green().bold(),
        EventOutcome::SyncFailed { .. } | EventOutcome::BuildFailed { .. } => {
            outcome.label().red().bold()
        }
        EventOutcome::NotImplemented { .. } => outcome.label().yellow(),
        EventOutcome::Ignored { .. } => outcome.label().dimmed(),
    };
    println!("{} {}", label, outcome);
}
