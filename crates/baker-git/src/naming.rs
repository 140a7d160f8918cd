//! Filesystem-safe names derived from component identifiers

/// Convert a component or branch name to a flat slug.
///
/// `libsigc++/f39` -> `libsigc-f39`
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_dash = true; // Start true to skip leading dashes

    for c in name.chars() {
        if c.is_alphanumeric() {
            result.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Prefix for a scoped temporary directory, e.g. `repo-rpms-bash-`.
pub fn temp_prefix(kind: &str, namespace: &str, component: &str) -> String {
    format!("{}-{}-{}-", kind, namespace, slugify(component))
}
