//! Summary of a concluded action for presentation and AI consumers.

use super::handle::{ActionHandle, SubEffectState, TargetResult};
use crate::combat::PackageOutcome;
use crate::combatant::CombatantId;

/// How an action invocation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Termination {
    /// Every sub-effect was processed.
    Completed,
    /// The user died mid-action; remaining sub-effects were aborted.
    UserDied,
    /// Ended prematurely by the caller.
    Interrupted,
}

/// One target's line in a sub-effect report.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetReport {
    pub result: TargetResult,
    /// Outcome of each effect package, in declaration order.
    pub packages: Vec<PackageOutcome>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubEffectReport {
    pub name: String,
    pub state: SubEffectState,
    pub targets: Vec<TargetReport>,
}

impl SubEffectReport {
    pub fn target(&self, id: CombatantId) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.result.target == id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionReport {
    pub action: String,
    pub user: CombatantId,
    pub sub_effects: Vec<SubEffectReport>,
    pub termination: Termination,
}

impl ActionReport {
    pub(crate) fn from_handle(handle: &ActionHandle, termination: Termination) -> Self {
        let sub_effects = handle
            .sub_effects
            .iter()
            .map(|sub| {
                let targets = sub
                    .results
                    .iter()
                    .map(|result| TargetReport {
                        result: *result,
                        packages: sub
                            .packages
                            .iter()
                            .map(|p| {
                                p.outcome(result.target)
                                    .unwrap_or(PackageOutcome::NotApplicable)
                            })
                            .collect(),
                    })
                    .collect();
                SubEffectReport {
                    name: handle.action.sub_effects[sub.index].name.clone(),
                    state: sub.state,
                    targets,
                }
            })
            .collect();

        Self {
            action: handle.action.name.clone(),
            user: handle.user,
            sub_effects,
            termination,
        }
    }

    pub fn sub_effect(&self, name: &str) -> Option<&SubEffectReport> {
        self.sub_effects.iter().find(|s| s.name == name)
    }

    /// Net health removed from `target` across the whole action.
    pub fn total_dealt_to(&self, target: CombatantId) -> i32 {
        self.sub_effects
            .iter()
            .filter_map(|s| s.target(target))
            .map(|t| t.result.dealt)
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Completed
    }
}
