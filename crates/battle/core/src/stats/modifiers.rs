//! Active modifiers - buffs, debuffs and statuses carried by a combatant.
//!
//! Modifiers are the runtime residue of effect packages. Stat modifiers feed
//! the bonus stack of their stat; statuses resolve once per tick. Every
//! modifier expires after its remaining duration (in the holder's turns).

use arrayvec::ArrayVec;

use super::bonus::Bonus;
use super::core::StatKind;
use crate::combatant::CombatantId;
use crate::config::BattleConfig;

/// Statuses resolved at the end of the holder's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    /// Loses `potency` health per tick.
    Poisoned,
    /// Recovers `potency` health per tick.
    Regenerating,
}

/// What an active modifier does.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierKind {
    Stat { stat: StatKind, bonus: Bonus },
    Status { status: StatusKind, potency: i32 },
}

impl ModifierKind {
    /// Two modifiers are the same effect when they would stack identically.
    fn same_effect(&self, other: &ModifierKind) -> bool {
        match (self, other) {
            (
                ModifierKind::Stat { stat: a, bonus: x },
                ModifierKind::Stat { stat: b, bonus: y },
            ) => a == b && x == y,
            (ModifierKind::Status { status: a, .. }, ModifierKind::Status { status: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

/// A modifier currently affecting a combatant.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveModifier {
    pub source: CombatantId,
    pub kind: ModifierKind,
    /// Remaining duration in the holder's turns.
    pub remaining: u32,
}

/// Result of adding a modifier to a [`ModifierSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierApplication {
    /// A new modifier entry was added.
    Added,
    /// An identical modifier was already active; its duration was refreshed.
    Refreshed,
}

/// Net result of resolving one tick of a combatant's modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Positive = damage, negative = healing.
    pub health_delta: i32,
    pub expired: usize,
}

/// Bounded set of active modifiers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModifierSet {
    entries: ArrayVec<ActiveModifier, { BattleConfig::MAX_MODIFIERS }>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a modifier, refreshing an identical one instead of stacking.
    ///
    /// When the set is full the entry closest to expiry is evicted.
    pub fn apply(&mut self, modifier: ActiveModifier) -> ModifierApplication {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|m| m.kind.same_effect(&modifier.kind))
        {
            existing.remaining = existing.remaining.max(modifier.remaining);
            existing.source = modifier.source;
            if let (
                ModifierKind::Status { potency: old, .. },
                ModifierKind::Status { potency: new, .. },
            ) = (&mut existing.kind, modifier.kind)
            {
                *old = (*old).max(new);
            }
            return ModifierApplication::Refreshed;
        }

        if self.entries.is_full()
            && let Some(evict) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, m)| m.remaining)
                .map(|(i, _)| i)
        {
            self.entries.remove(evict);
        }
        self.entries.push(modifier);
        ModifierApplication::Added
    }

    /// Bonuses active modifiers contribute to `stat`.
    pub fn stat_bonuses(&self, stat: StatKind) -> impl Iterator<Item = Bonus> + '_ {
        self.entries.iter().filter_map(move |m| match m.kind {
            ModifierKind::Stat { stat: s, bonus } if s == stat => Some(bonus),
            _ => None,
        })
    }

    pub fn has_status(&self, status: StatusKind) -> bool {
        self.entries
            .iter()
            .any(|m| matches!(m.kind, ModifierKind::Status { status: s, .. } if s == status))
    }

    /// Resolves statuses and counts every modifier down by one turn.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        for modifier in &mut self.entries {
            if let ModifierKind::Status { status, potency } = modifier.kind {
                match status {
                    StatusKind::Poisoned => report.health_delta += potency,
                    StatusKind::Regenerating => report.health_delta -= potency,
                }
            }
            modifier.remaining = modifier.remaining.saturating_sub(1);
        }
        let before = self.entries.len();
        self.entries.retain(|m| m.remaining > 0);
        report.expired = before - self.entries.len();
        report
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveModifier> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
