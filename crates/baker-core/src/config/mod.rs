//! Configuration model, validation and loading
//!
//! A configuration is loaded all-or-nothing: [`ConfigLoader`] returns either a
//! fully validated [`Configuration`] or an error, never a partial document.
//! The live configuration sits in a [`ConfigurationStore`] and is only ever
//! replaced whole.

mod loader;
mod model;
mod store;
mod validate;

pub use loader::{CONFIG_FILE_NAME, ConfigLoader, ConfigSource, LoadedConfiguration};
pub(crate) use loader::remove_partial;
pub use model::{
    BuildSettings, CacheSettings, ComponentEntry, Components, Configuration, Control, GitSettings,
    ScmSide, Settings, Triggers,
};
pub use store::ConfigurationStore;
pub use validate::validate;
