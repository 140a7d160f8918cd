//! Semantic checks applied after a configuration parses

use crate::namespace::Namespace;
use crate::{Error, Result};

use super::model::Configuration;

/// Reject configurations with empty required values.
///
/// Returns the list of non-fatal warnings, each already logged.
pub fn validate(config: &Configuration) -> Result<Vec<String>> {
    let s = &config.settings;
    let required = [
        ("source.scm", &s.source.scm),
        ("source.cache.url", &s.source.cache.url),
        ("source.cache.cgi", &s.source.cache.cgi),
        ("source.cache.path", &s.source.cache.path),
        ("destination.scm", &s.destination.scm),
        ("destination.cache.url", &s.destination.cache.url),
        ("destination.cache.cgi", &s.destination.cache.cgi),
        ("destination.cache.path", &s.destination.cache.path),
        ("build.profile", &s.build.profile),
        ("build.prefix", &s.build.prefix),
        ("build.target", &s.build.target),
        ("git.author", &s.git.author),
        ("git.email", &s.git.email),
        ("git.message", &s.git.message),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(Error::config(format!("{key} must not be empty")));
        }
    }

    for namespace in Namespace::ALL {
        for (name, entry) in config.components.namespace(namespace) {
            if entry.source.trim().is_empty() || entry.destination.trim().is_empty() {
                return Err(Error::config(format!(
                    "{namespace}/{name} needs both source and destination"
                )));
            }
        }
    }

    let mut warnings = Vec::new();
    for namespace in Namespace::ALL {
        if s.trigger.for_namespace(namespace).is_none() {
            warnings.push(format!("no trigger configured for {namespace}"));
        }
    }
    if s.build.scratch.is_none() {
        warnings.push("build.scratch not defined, assuming false".to_string());
    }
    if config.components.is_empty() {
        warnings.push("no components configured".to_string());
    }

    for warning in &warnings {
        tracing::warn!("Configuration warning: {}", warning);
    }
    Ok(warnings)
}
