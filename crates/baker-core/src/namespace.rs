//! Dist-git namespaces

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Top-level dist-git namespace a component lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Rpms,
    Modules,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Rpms, Namespace::Modules];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rpms => "rpms",
            Self::Modules => "modules",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpms" => Ok(Self::Rpms),
            "modules" => Ok(Self::Modules),
            other => Err(Error::UnsupportedNamespace {
                namespace: other.to_string(),
            }),
        }
    }
}
