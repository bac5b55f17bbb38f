//! Event types for different topics.

use battle_core::{ActionReport, BattleOutcome, CombatantId};
use serde::{Deserialize, Serialize};

/// Battle lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    Started { combatants: usize, seed: u64 },
    Decided { outcome: BattleOutcome, turns: u64 },
}

/// Events related to turn management (lightweight).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A combatant received the turn.
    Started { actor: CombatantId, turn: u64 },
    /// The turn ended and the actor's delay was charged.
    Ended {
        actor: CombatantId,
        turn: u64,
        delay: f32,
        /// Net health change from end-of-turn modifiers (positive = damage).
        tick_health_delta: i32,
    },
}

/// Events related to action resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionEvent {
    /// An action concluded, fully or after an interrupt.
    Concluded { report: ActionReport },
    /// The battle refused the chosen action; the turn was passed instead.
    Rejected {
        actor: CombatantId,
        action: String,
        error: String,
    },
    /// Presentation stalled and the action in flight was ended early.
    Interrupted { actor: CombatantId },
}
