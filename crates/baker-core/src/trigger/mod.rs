//! Event-driven pipeline entry point
//!
//! - **message**: bus [`Message`]s and the [`TagEvent`]s they carry
//! - **dispatcher**: [`TriggerDispatcher`], matching events against triggers
//!   and the component registry
//! - **outcome**: the [`EventOutcome`] each event ends in

mod dispatcher;
mod message;
mod outcome;

pub use dispatcher::{ComponentBuild, ComponentSync, TriggerDispatcher};
pub use message::{Message, TAG_TOPIC_SUFFIX, TagEvent};
pub use outcome::EventOutcome;
