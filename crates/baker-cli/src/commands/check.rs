//! Check command implementation

use baker_core::{Configuration, Namespace};
use colored::Colorize;

use crate::app::App;
use crate::error::Result;

/// Load and validate the configuration, then summarize it.
pub fn run_check(app: &App) -> Result<()> {
    let source = app.config_source()?;
    let config = app.load_config(&source)?;

    println!("{} {}", "Configuration OK:".green().bold(), source);
    print_summary(&config);
    Ok(())
}

fn print_summary(config: &Configuration) {
    let settings = &config.settings;
    let strategy = if settings.control.merge {
        "merge"
    } else {
        "fast-forward"
    };
    let builds = if settings.control.build {
        format!(
            "enabled ({} -> {}, profile {})",
            settings.build.prefix, settings.build.target, settings.build.profile
        )
    } else {
        "disabled".to_string()
    };

    println!("  {:<13} {}", "source:", settings.source.scm);
    println!("  {:<13} {}", "destination:", settings.destination.scm);
    println!("  {:<13} {}", "strategy:", strategy);
    println!("  {:<13} {}", "builds:", builds);
    for namespace in Namespace::ALL {
        let trigger = settings.trigger.for_namespace(namespace).unwrap_or("-");
        println!("  {:<13} {}", format!("{} trigger:", namespace), trigger);
    }

    println!();
    println!("{} ({})", "Components".bold(), config.components.len());
    for namespace in Namespace::ALL {
        for (name, entry) in config.components.namespace(namespace) {
            println!(
                "  {}/{}  {} {} {}",
                namespace,
                name.cyan(),
                entry.source,
                "->".dimmed(),
                entry.destination
            );
        }
    }
}
