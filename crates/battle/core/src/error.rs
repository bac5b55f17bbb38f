//! Common error infrastructure for battle-core.
//!
//! Errors fall into two fatal classes: definition errors are raised while an
//! action definition is compiled, precondition violations are raised when a
//! caller breaks the contract of the scheduler, the resolution engine or the
//! battle state machine. Miss, no-sell and partial success are resolution
//! outcomes and never surface through these types.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each class has its own error enum with specific variants
//! - **Severity Classification**: Errors are categorized for logging and triage
//! - **No Silent No-ops**: Contract violations are returned, never swallowed

use crate::battle::{BattleOutcome, BattlePhase};
use crate::combatant::CombatantId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Validation**: Invalid definition data, rejected before the engine runs
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: The caller violated a contract; the current operation is aborted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: forward determinant reference, tie index out of range
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - a caller contract was violated.
    ///
    /// Examples: second action started while one is in flight
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error indicates a bug or contract violation.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on who must fix the problem, not on impact
pub trait BattleErrorKind: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}

/// Which kind of cross reference a definition error is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceKind {
    DamageDeterminant,
    SuccessDeterminant,
    Predicate,
}

// ============================================================================
// Definition Errors
// ============================================================================

/// Malformed action or stance data, detected when a definition is compiled.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DefinitionError {
    #[error("action name must not be empty")]
    EmptyActionName,

    #[error("action '{action}': sub-effect #{index} has an empty name")]
    EmptySubEffectName { action: String, index: usize },

    #[error("action '{action}': duplicate sub-effect name '{name}'")]
    DuplicateSubEffect { action: String, name: String },

    #[error("sub-effect '{sub_effect}': {kind} references unknown sub-effect '{target}'")]
    UnknownReference {
        sub_effect: String,
        kind: ReferenceKind,
        target: String,
    },

    #[error("sub-effect '{sub_effect}': {kind} references itself")]
    SelfReference {
        sub_effect: String,
        kind: ReferenceKind,
    },

    #[error("sub-effect '{sub_effect}': {kind} references later sub-effect '{target}'")]
    ForwardReference {
        sub_effect: String,
        kind: ReferenceKind,
        target: String,
    },

    #[error("sub-effect '{sub_effect}': selects no target set")]
    NoTargetSets { sub_effect: String },

    #[error("sub-effect '{sub_effect}': accuracy {value} is outside [0, 1]")]
    InvalidAccuracy { sub_effect: String, value: f32 },

    #[error("sub-effect '{sub_effect}': damage magnitude {value} is not finite")]
    InvalidDamage { sub_effect: String, value: f32 },

    #[error("sub-effect '{sub_effect}' package #{package}: success rate {value} is outside [0, 1]")]
    InvalidSuccessRate {
        sub_effect: String,
        package: usize,
        value: f32,
    },

    #[error(
        "sub-effect '{sub_effect}' package #{package}: tie index {tie} is out of range ({count} packages)"
    )]
    TieOutOfRange {
        sub_effect: String,
        package: usize,
        tie: usize,
        count: usize,
    },

    #[error("sub-effect '{sub_effect}' package #{package}: tie index {tie} is not an earlier package")]
    TieNotEarlier {
        sub_effect: String,
        package: usize,
        tie: usize,
    },

    #[error("sub-effect '{sub_effect}' package #{package}: {kind} requires {expected} magnitude")]
    MagnitudeMismatch {
        sub_effect: String,
        package: usize,
        kind: &'static str,
        expected: &'static str,
    },

    #[error("event block '{block}': duplicate layer priority {priority}")]
    DuplicateLayerPriority { block: String, priority: i32 },

    #[error("stance '{stance}': bonus for {stat} is not finite")]
    InvalidStanceBonus { stance: String, stat: String },
}

impl BattleErrorKind for DefinitionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use DefinitionError::*;
        match self {
            EmptyActionName => "DEFINITION_EMPTY_ACTION_NAME",
            EmptySubEffectName { .. } => "DEFINITION_EMPTY_SUB_EFFECT_NAME",
            DuplicateSubEffect { .. } => "DEFINITION_DUPLICATE_SUB_EFFECT",
            UnknownReference { .. } => "DEFINITION_UNKNOWN_REFERENCE",
            SelfReference { .. } => "DEFINITION_SELF_REFERENCE",
            ForwardReference { .. } => "DEFINITION_FORWARD_REFERENCE",
            NoTargetSets { .. } => "DEFINITION_NO_TARGET_SETS",
            InvalidAccuracy { .. } => "DEFINITION_INVALID_ACCURACY",
            InvalidDamage { .. } => "DEFINITION_INVALID_DAMAGE",
            InvalidSuccessRate { .. } => "DEFINITION_INVALID_SUCCESS_RATE",
            TieOutOfRange { .. } => "DEFINITION_TIE_OUT_OF_RANGE",
            TieNotEarlier { .. } => "DEFINITION_TIE_NOT_EARLIER",
            MagnitudeMismatch { .. } => "DEFINITION_MAGNITUDE_MISMATCH",
            DuplicateLayerPriority { .. } => "DEFINITION_DUPLICATE_LAYER_PRIORITY",
            InvalidStanceBonus { .. } => "DEFINITION_INVALID_STANCE_BONUS",
        }
    }
}

// ============================================================================
// Precondition Violations
// ============================================================================

/// A caller broke the contract of the scheduler, engine or state machine.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PreconditionError {
    #[error("an action is already in progress")]
    ActionInFlight,

    #[error("no action is in progress")]
    NoActionInFlight,

    #[error("no combatant is currently acting")]
    NoCurrentActor,

    #[error("a turn is already in progress")]
    TurnInProgress,

    #[error("no combatant is ready to act")]
    NoReadyCombatant,

    #[error("{operation} is not legal while the battle is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: BattlePhase,
    },

    #[error("battle is paused")]
    Paused,

    #[error("battle has not been started")]
    Offline,

    #[error("battle is already decided: {0}")]
    Decided(BattleOutcome),

    #[error("combatant {0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} is dead")]
    DeadCombatant(CombatantId),

    #[error("combatant {target} is not an eligible target for '{action}'")]
    IneligibleTarget { action: String, target: CombatantId },

    #[error("'{action}' accepts at most {max} primary target(s), got {got}")]
    TooManyTargets {
        action: String,
        max: usize,
        got: usize,
    },

    #[error("insufficient stamina: required {required}, available {available}")]
    InsufficientStamina { required: i32, available: i32 },
}

impl BattleErrorKind for PreconditionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        use PreconditionError::*;
        match self {
            ActionInFlight => "PRECONDITION_ACTION_IN_FLIGHT",
            NoActionInFlight => "PRECONDITION_NO_ACTION_IN_FLIGHT",
            NoCurrentActor => "PRECONDITION_NO_CURRENT_ACTOR",
            TurnInProgress => "PRECONDITION_TURN_IN_PROGRESS",
            NoReadyCombatant => "PRECONDITION_NO_READY_COMBATANT",
            InvalidPhase { .. } => "PRECONDITION_INVALID_PHASE",
            Paused => "PRECONDITION_PAUSED",
            Offline => "PRECONDITION_OFFLINE",
            Decided(_) => "PRECONDITION_DECIDED",
            UnknownCombatant(_) => "PRECONDITION_UNKNOWN_COMBATANT",
            DeadCombatant(_) => "PRECONDITION_DEAD_COMBATANT",
            IneligibleTarget { .. } => "PRECONDITION_INELIGIBLE_TARGET",
            TooManyTargets { .. } => "PRECONDITION_TOO_MANY_TARGETS",
            InsufficientStamina { .. } => "PRECONDITION_INSUFFICIENT_STAMINA",
        }
    }
}

// ============================================================================
// Battle Error
// ============================================================================

/// Errors surfaced by the [`crate::Battle`] façade.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BattleError {
    #[error("invalid definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionError),
}

impl BattleErrorKind for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            BattleError::Definition(e) => e.severity(),
            BattleError::Precondition(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            BattleError::Definition(e) => e.error_code(),
            BattleError::Precondition(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_errors_are_validation_severity() {
        let error = DefinitionError::SelfReference {
            sub_effect: "strike".into(),
            kind: ReferenceKind::DamageDeterminant,
        };
        assert_eq!(error.severity(), ErrorSeverity::Validation);
        assert_eq!(error.error_code(), "DEFINITION_SELF_REFERENCE");
        assert_eq!(
            error.to_string(),
            "sub-effect 'strike': damage_determinant references itself"
        );
    }

    #[test]
    fn precondition_errors_are_fatal() {
        let error: BattleError = PreconditionError::ActionInFlight.into();
        assert!(error.severity().is_fatal());
        assert_eq!(error.error_code(), "PRECONDITION_ACTION_IN_FLIGHT");
    }
}
