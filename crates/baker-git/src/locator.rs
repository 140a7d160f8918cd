//! Combined `url#ref` repository locators

use std::fmt;
use std::str::FromStr;

/// Ref used when a locator carries no `#ref` segment.
pub const DEFAULT_REF: &str = "master";

/// A repository URL paired with a branch or ref name.
///
/// Parsed from the combined `<repository-url>[#<ref>]` form used throughout
/// the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScmLocator {
    pub url: String,
    pub reference: String,
}

impl ScmLocator {
    pub fn new(url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reference: reference.into(),
        }
    }

    /// Split a combined locator on the first `#`.
    ///
    /// A missing or empty ref segment falls back to [`DEFAULT_REF`].
    pub fn parse(combined: &str) -> Self {
        match combined.split_once('#') {
            Some((url, reference)) if !reference.is_empty() => Self::new(url, reference),
            Some((url, _)) => Self::new(url, DEFAULT_REF),
            None => Self::new(combined, DEFAULT_REF),
        }
    }
}

impl FromStr for ScmLocator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ScmLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.url, self.reference)
    }
}
