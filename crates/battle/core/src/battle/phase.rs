//! Coarse battle phases and per-turn summaries.

use crate::action::ActionReport;
use crate::combatant::CombatantId;
use crate::stats::TickReport;

/// Which operations are legal right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattlePhase {
    /// Constructed but not started.
    Offline,
    /// No turn in progress; the scheduler may advance.
    BetweenTurns,
    /// A combatant holds the turn and must choose an action or pass.
    AwaitingInput,
    /// An action is being resolved.
    ExecutingAction,
    Won,
    Lost,
}

impl BattlePhase {
    pub fn outcome(self) -> Option<BattleOutcome> {
        match self {
            BattlePhase::Won => Some(BattleOutcome::Won),
            BattlePhase::Lost => Some(BattleOutcome::Lost),
            _ => None,
        }
    }

    pub fn is_decided(self) -> bool {
        self.outcome().is_some()
    }
}

/// Final result of a battle, from the player side's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattleOutcome {
    Won,
    Lost,
}

impl From<BattleOutcome> for BattlePhase {
    fn from(outcome: BattleOutcome) -> Self {
        match outcome {
            BattleOutcome::Won => BattlePhase::Won,
            BattleOutcome::Lost => BattlePhase::Lost,
        }
    }
}

/// What happened when a turn ended.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnSummary {
    pub actor: CombatantId,
    /// `None` when the actor passed.
    pub report: Option<ActionReport>,
    /// Delay added to the actor after speed scaling.
    pub delay: f32,
    /// End-of-turn modifier resolution for the actor.
    pub tick: TickReport,
    pub outcome: Option<BattleOutcome>,
}

/// Where the battle stands after feeding it input.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnProgress {
    /// The current action is waiting on presentation.
    Waiting,
    TurnEnded(TurnSummary),
}

impl TurnProgress {
    pub fn summary(&self) -> Option<&TurnSummary> {
        match self {
            TurnProgress::Waiting => None,
            TurnProgress::TurnEnded(summary) => Some(summary),
        }
    }
}
