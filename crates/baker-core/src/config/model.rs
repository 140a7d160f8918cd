//! Configuration document model
//!
//! Mirrors `distrobaker.yaml`:
//!
//! ```yaml
//! configuration:
//!   source:
//!     scm: https://src.fedoraproject.org
//!     cache: { url: ..., cgi: ..., path: ... }
//!   destination: { scm: ..., cache: { ... } }
//!   trigger: { rpms: f39-updates-candidate, modules: ... }
//!   build: { profile: ..., prefix: ..., target: ..., mbs: ..., scratch: false }
//!   git: { author: ..., email: ..., message: ... }
//!   control: { build: true, merge: true }
//! components:
//!   rpms:
//!     bash: { source: bash#f39, destination: bash#c9s }
//! ```

use std::collections::BTreeMap;

use baker_git::{Identity, ScmLocator};
use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;

/// A complete, parsed configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "configuration")]
    pub settings: Settings,
    #[serde(default)]
    pub components: Components,
}

/// The `configuration` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub source: ScmSide,
    pub destination: ScmSide,
    #[serde(default)]
    pub trigger: Triggers,
    pub build: BuildSettings,
    pub git: GitSettings,
    pub control: Control,
}

/// One side (upstream or downstream) of the synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScmSide {
    /// Base SCM URL; component paths are appended as `/<namespace>/<path>`.
    pub scm: String,
    pub cache: CacheSettings,
}

/// Lookaside cache endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Base download URL.
    pub url: String,
    /// Upload / existence-check CGI endpoint.
    pub cgi: String,
    /// Download path template with `%(name)s`, `%(filename)s`, `%(hash)s`
    /// and `%(hashtype)s` placeholders.
    pub path: String,
}

/// Tags that trigger synchronization, per namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    pub rpms: Option<String>,
    pub modules: Option<String>,
}

impl Triggers {
    pub fn for_namespace(&self, namespace: Namespace) -> Option<&str> {
        match namespace {
            Namespace::Rpms => self.rpms.as_deref(),
            Namespace::Modules => self.modules.as_deref(),
        }
    }

    /// Namespace whose trigger equals `tag`, rpms first.
    pub fn namespace_for_tag(&self, tag: &str) -> Option<Namespace> {
        Namespace::ALL
            .into_iter()
            .find(|ns| self.for_namespace(*ns) == Some(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Build system client profile.
    pub profile: String,
    /// SCM prefix used in build source locators.
    pub prefix: String,
    pub target: String,
    /// Module build service URL, kept for the module pipeline.
    pub mbs: String,
    #[serde(default)]
    pub scratch: Option<bool>,
}

impl BuildSettings {
    pub fn scratch(&self) -> bool {
        self.scratch.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSettings {
    pub author: String,
    pub email: String,
    /// First line of every synchronization commit message.
    pub message: String,
}

impl GitSettings {
    pub fn identity(&self) -> Identity {
        Identity {
            name: self.author.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Submit builds after a successful synchronization.
    pub build: bool,
    /// Use the merge-preserving strategy instead of fast-forward only.
    pub merge: bool,
}

/// Component registry keyed by namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub rpms: BTreeMap<String, ComponentEntry>,
    #[serde(default)]
    pub modules: BTreeMap<String, ComponentEntry>,
}

impl Components {
    pub fn namespace(&self, namespace: Namespace) -> &BTreeMap<String, ComponentEntry> {
        match namespace {
            Namespace::Rpms => &self.rpms,
            Namespace::Modules => &self.modules,
        }
    }

    pub fn len(&self) -> usize {
        self.rpms.len() + self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source and destination `path#ref` for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub source: String,
    pub destination: String,
}

impl Configuration {
    pub fn component(&self, namespace: Namespace, name: &str) -> Option<&ComponentEntry> {
        self.components.namespace(namespace).get(name)
    }

    /// Upstream locator for a registered component.
    pub fn source_locator(&self, namespace: Namespace, name: &str) -> Option<ScmLocator> {
        self.component(namespace, name).map(|entry| {
            ScmLocator::parse(&format!(
                "{}/{}/{}",
                self.settings.source.scm, namespace, entry.source
            ))
        })
    }

    /// Downstream locator for a registered component.
    pub fn destination_locator(&self, namespace: Namespace, name: &str) -> Option<ScmLocator> {
        self.component(namespace, name).map(|entry| {
            ScmLocator::parse(&format!(
                "{}/{}/{}",
                self.settings.destination.scm, namespace, entry.destination
            ))
        })
    }
}
