//! Atomic action vocabulary and executor.
//!
//! [`ActionRequest`] is the exact JSON object exchanged with the language
//! model. Before dispatch it is classified into the typed [`PlannedAction`]
//! union, so each action variant carries only the fields that are valid for
//! it. The executor re-resolves every selector against the live page at
//! execution time; a selector that has gone stale since sensing is an
//! ordinary per-step failure.

pub mod errors;
pub mod executor;
pub mod extract;
pub mod model;
pub mod scripts;

pub use errors::ActionError;
pub use executor::{ActionExecutor, ActionReport, ExecConfig};
pub use model::{
    ActionKind, ActionOptions, ActionRequest, PlannedAction, ScrollDirection, ScrollTarget,
    Selector,
};
