//! Sources command implementation

use std::path::Path;

use baker_core::Manifest;
use colored::Colorize;

use crate::error::Result;

/// Print every record of a `sources` manifest.
pub fn run_sources(file: &Path) -> Result<()> {
    let manifest = Manifest::load(file)?;

    for record in manifest.records() {
        println!(
            "{:<7} {}  {}",
            record.algorithm().as_str().cyan(),
            record.filename(),
            record.hash().dimmed()
        );
    }

    let unique = manifest.entries().len();
    println!();
    println!(
        "{} record(s), {} unique file(s)",
        manifest.records().len(),
        unique
    );
    Ok(())
}
