//! Runtime handles for one action invocation.
//!
//! Ownership is strictly top-down: the [`ActionHandle`] owns one
//! [`SubEffectHandle`] per sub-effect, which owns one [`PackageHandle`] per
//! effect package. Handles are built when an action begins and discarded
//! when it concludes.

use std::sync::Arc;

use super::compile::CompiledAction;
use super::targeting::TargetSets;
use crate::combat::{PackageOutcome, TargetOutcome};
use crate::combatant::{CombatantId, Roster};

/// Lifecycle of a sub-effect within an invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SubEffectState {
    Pending,
    Executed,
    /// Predicate unmet or no targets left.
    Skipped,
    /// Cut off by an interrupt or the user's death.
    Aborted,
}

/// Resolution of a sub-effect against one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetResult {
    pub target: CombatantId,
    pub outcome: TargetOutcome,
    /// Damage figure computed for the target, applied only when it landed.
    pub figure: i32,
    /// Health actually removed (negative when healed).
    pub dealt: i32,
    pub died: bool,
}

/// Per-target outcomes of one effect package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageHandle {
    pub(crate) outcomes: Vec<(CombatantId, PackageOutcome)>,
}

impl PackageHandle {
    pub fn outcome(&self, target: CombatantId) -> Option<PackageOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == target)
            .map(|(_, outcome)| *outcome)
    }

    pub fn outcomes(&self) -> &[(CombatantId, PackageOutcome)] {
        &self.outcomes
    }

    /// Targets the package took hold on.
    pub fn succeeded(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.succeeded())
            .map(|(id, _)| *id)
    }
}

/// Runtime state of one sub-effect.
#[derive(Clone, Debug, PartialEq)]
pub struct SubEffectHandle {
    pub(crate) index: usize,
    pub(crate) sets: TargetSets,
    pub(crate) targets: Vec<CombatantId>,
    pub(crate) state: SubEffectState,
    pub(crate) results: Vec<TargetResult>,
    pub(crate) packages: Vec<PackageHandle>,
}

impl SubEffectHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> SubEffectState {
        self.state
    }

    /// Current (pruned) target list.
    pub fn targets(&self) -> &[CombatantId] {
        &self.targets
    }

    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    pub fn result(&self, target: CombatantId) -> Option<&TargetResult> {
        self.results.iter().find(|r| r.target == target)
    }

    pub fn packages(&self) -> &[PackageHandle] {
        &self.packages
    }

    /// Executed and reached at least one target.
    pub fn landed_any(&self) -> bool {
        self.state == SubEffectState::Executed && self.results.iter().any(|r| r.outcome.landed())
    }

    /// Mean of the computed figures, zero when there are none.
    pub fn mean_figure(&self) -> i32 {
        if self.results.is_empty() {
            return 0;
        }
        let sum: i64 = self.results.iter().map(|r| i64::from(r.figure)).sum();
        (sum as f64 / self.results.len() as f64).round() as i32
    }
}

/// Runtime state of one action invocation.
#[derive(Clone, Debug)]
pub struct ActionHandle {
    pub(crate) action: Arc<CompiledAction>,
    pub(crate) user: CombatantId,
    pub(crate) primary: Vec<CombatantId>,
    pub(crate) alternate: Vec<CombatantId>,
    pub(crate) sub_effects: Vec<SubEffectHandle>,
}

impl ActionHandle {
    pub(crate) fn new(
        action: Arc<CompiledAction>,
        user: CombatantId,
        primary: Vec<CombatantId>,
        alternate: Vec<CombatantId>,
    ) -> Self {
        let sub_effects = action
            .sub_effects
            .iter()
            .enumerate()
            .map(|(index, sub)| SubEffectHandle {
                index,
                sets: sub.targets,
                targets: select_targets(sub.targets, user, &primary, &alternate),
                state: SubEffectState::Pending,
                results: Vec::new(),
                packages: vec![PackageHandle::default(); sub.packages.len()],
            })
            .collect();

        Self {
            action,
            user,
            primary,
            alternate,
            sub_effects,
        }
    }

    pub fn action(&self) -> &CompiledAction {
        &self.action
    }

    pub fn user(&self) -> CombatantId {
        self.user
    }

    pub fn primary(&self) -> &[CombatantId] {
        &self.primary
    }

    pub fn alternate(&self) -> &[CombatantId] {
        &self.alternate
    }

    pub fn sub_effect(&self, index: usize) -> Option<&SubEffectHandle> {
        self.sub_effects.get(index)
    }

    pub fn sub_effect_by_name(&self, name: &str) -> Option<&SubEffectHandle> {
        self.action
            .sub_effect_index(name)
            .and_then(|i| self.sub_effects.get(i))
    }

    /// Removes dead combatants from every target list. Returns how many
    /// entries were removed.
    pub(crate) fn prune(&mut self, roster: &Roster) -> usize {
        let mut removed = prune_list(&mut self.primary, roster);
        removed += prune_list(&mut self.alternate, roster);
        for sub in &mut self.sub_effects {
            removed += prune_list(&mut sub.targets, roster);
        }
        removed
    }
}

fn prune_list(list: &mut Vec<CombatantId>, roster: &Roster) -> usize {
    let before = list.len();
    list.retain(|&id| roster.is_alive(id));
    before - list.len()
}

/// Union of the selected target lists, without duplicates, in list order.
fn select_targets(
    sets: TargetSets,
    user: CombatantId,
    primary: &[CombatantId],
    alternate: &[CombatantId],
) -> Vec<CombatantId> {
    let mut targets = Vec::new();
    let mut push = |id: CombatantId| {
        if !targets.contains(&id) {
            targets.push(id);
        }
    };
    if sets.contains(TargetSets::USER) {
        push(user);
    }
    if sets.contains(TargetSets::PRIMARY) {
        primary.iter().copied().for_each(&mut push);
    }
    if sets.contains(TargetSets::ALTERNATE) {
        alternate.iter().copied().for_each(&mut push);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_union_without_duplicates() {
        let user = CombatantId(0);
        let primary = [CombatantId(1), CombatantId(2)];
        let alternate = [CombatantId(2), CombatantId(3)];

        let all = select_targets(
            TargetSets::USER | TargetSets::PRIMARY | TargetSets::ALTERNATE,
            user,
            &primary,
            &alternate,
        );
        assert_eq!(
            all,
            vec![CombatantId(0), CombatantId(1), CombatantId(2), CombatantId(3)]
        );
        assert_eq!(
            select_targets(TargetSets::USER, user, &primary, &alternate),
            vec![user]
        );
    }

    #[test]
    fn mean_figure_rounds() {
        let result = |target, figure| TargetResult {
            target: CombatantId(target),
            outcome: TargetOutcome::HitOrHealed,
            figure,
            dealt: figure,
            died: false,
        };
        let handle = SubEffectHandle {
            index: 0,
            sets: TargetSets::PRIMARY,
            targets: vec![],
            state: SubEffectState::Executed,
            results: vec![result(1, 10), result(2, 15)],
            packages: vec![],
        };
        assert_eq!(handle.mean_figure(), 13);
    }
}
