//! Asynchronous embedding of the battle core.
//!
//! This crate wires the decision provider abstraction, the presentation
//! channel and the topic event bus around a [`battle_core::Battle`]. Consumers
//! build a [`BattleRunner`] to play turns, subscribe to events, and plug in
//! their own input, AI and rendering.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the runner and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`presentation`] bridges presentation requests and completion signals
//! - [`scenario`] loads rosters and action catalogues from RON
//! - [`logging`] installs the tracing subscriber
pub mod api;
pub mod events;
pub mod logging;
pub mod presentation;
pub mod runtime;
pub mod scenario;

pub use api::{
    ActionChoice, ActionProvider, ChannelProvider, Decision, DecisionRequest, FocusFireProvider,
    PassProvider, ProviderKind, Result, RuntimeError,
};
pub use events::{ActionEvent, BattleEvent, Event, EventBus, Topic, TurnEvent};
pub use logging::{init_logging, init_logging_with};
pub use presentation::{
    ChannelPresenter, PresentationCommand, PresentationSignal, spawn_instant_presentation,
};
pub use runtime::{BattleRunner, BattleRunnerBuilder, RuntimeConfig};
pub use scenario::{ActionLibrary, Scenario};
