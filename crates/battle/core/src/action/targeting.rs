//! Targeting - shape, side eligibility and per-sub-effect target sets.

use bitflags::bitflags;

use crate::combatant::{Combatant, Relation};

/// How an action selects its primary targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TargetShape {
    /// At most one primary target.
    Single,
    /// Any number of primary targets in an area.
    Area,
    /// Any number of primary targets along a line.
    Line,
    /// The user only; primary targets are ignored.
    SelfOnly,
}

impl TargetShape {
    /// Maximum number of primary targets, `None` when unbounded.
    pub fn max_primary(self) -> Option<usize> {
        match self {
            TargetShape::Single | TargetShape::SelfOnly => Some(1),
            TargetShape::Area | TargetShape::Line => None,
        }
    }
}

bitflags! {
    /// Which sides an action may target, relative to the user.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct TargetSides: u8 {
        const USER    = 1 << 0;
        const ALLIES  = 1 << 1;
        const ENEMIES = 1 << 2;
        const NEUTRAL = 1 << 3;
    }
}

impl TargetSides {
    /// Whether `target` may be selected by `user` under these flags.
    pub fn admits(self, user: &Combatant, target: &Combatant) -> bool {
        let needed = match user.relation_to(target) {
            Relation::User => TargetSides::USER,
            Relation::Ally => TargetSides::ALLIES,
            Relation::Enemy => TargetSides::ENEMIES,
            Relation::Neutral => TargetSides::NEUTRAL,
        };
        self.contains(needed)
    }
}

bitflags! {
    /// Which of the action's target lists a sub-effect applies to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct TargetSets: u8 {
        const PRIMARY   = 1 << 0;
        const ALTERNATE = 1 << 1;
        const USER      = 1 << 2;
    }
}

impl TargetSets {
    /// Targets only the user.
    pub fn is_self(self) -> bool {
        self == TargetSets::USER
    }
}
