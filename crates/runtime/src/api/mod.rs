//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration and presentation plumbing.

pub mod errors;
pub mod providers;

pub use errors::{ProviderKind, Result, RuntimeError};
pub use providers::{
    ActionChoice, ActionProvider, ChannelProvider, Decision, DecisionRequest, FocusFireProvider,
    PassProvider,
};
