//! Unified error types surfaced by the runtime API.
//!
//! Wraps battle contract violations, definition failures, provider failures
//! and channel breakage so clients can bubble them up with consistent context.
use std::fmt;

use battle_core::{BattleError, DefinitionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error("action '{action}' failed to compile")]
    Definition {
        action: String,
        #[source]
        source: DefinitionError,
    },

    #[error("{kind} action provider not set")]
    ProviderNotSet { kind: ProviderKind },

    #[error("{kind} action provider failed: {reason}")]
    Provider { kind: ProviderKind, reason: String },

    #[error("presentation channel closed")]
    PresentationChannelClosed,

    #[error("battle undecided after {0} turns")]
    TurnLimitReached(u64),

    #[error("presentation task join failed")]
    TaskJoin(#[source] tokio::task::JoinError),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Which provider slot a combatant's decisions come from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Player,
    Npc,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderKind::Player => "player",
            ProviderKind::Npc => "npc",
        };
        write!(f, "{}", label)
    }
}
