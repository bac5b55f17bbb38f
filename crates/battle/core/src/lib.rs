//! Deterministic combat resolution for turn-based battles.
//!
//! `battle-core` decides whose turn is next, resolves the chosen action
//! against its targets and sequences the resulting presentation work. It is
//! synchronous and single-threaded: every operation runs until it has to wait
//! for presentation and then returns, leaving the caller to feed completion
//! signals back in. All state mutation flows through [`battle::Battle`].
pub mod action;
pub mod battle;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod error;
pub mod rng;
pub mod scheduler;
pub mod stats;
pub mod sync;

pub use action::{
    ActionCosts, ActionDefinition, ActionEngine, ActionHandle, ActionReport, CompiledAction,
    EffectKind, EffectPackageDefinition, EngineContext, EngineProgress, Magnitude, StatContest,
    SubEffectDefinition, SubEffectReport, SubEffectState, TargetReport, TargetSets, TargetShape,
    TargetSides, Termination,
};
pub use battle::{Battle, BattleOutcome, BattlePhase, TurnProgress, TurnSummary};
pub use combat::{DamageType, PackageOutcome, Resistances, TargetOutcome};
pub use combatant::{Combatant, CombatantId, CombatantSpec, Roster, Side};
pub use config::BattleConfig;
pub use error::{
    BattleError, BattleErrorKind, DefinitionError, ErrorSeverity, PreconditionError, ReferenceKind,
};
pub use rng::{BattleRng, RollSource};
pub use scheduler::{TieBreakStack, TurnScheduler};
pub use stats::{
    ActiveModifier, Bonus, ModifierKind, ResourceMeter, Stance, StatBlock, StatKind, StatusKind,
};
pub use sync::{
    BlockToken, Cast, Dispatch, EventBlock, EventLayer, EventSubject, EventTicket, NullPresenter,
    PresentationEvent, PresentationKind, PresentationRequest, Presenter, Subjects, Synchronizer,
};
