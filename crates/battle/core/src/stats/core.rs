//! Base Stats - the stored layer of the stat system.
//!
//! Base stats are the only stat values a combatant stores. Effective values
//! are recomputed on every query from the base, the active stance and the
//! active modifiers.

/// Every stat a combatant carries.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StatKind {
    MaxHealth,
    MaxStamina,
    /// Drives delay accrual relative to the battle's normalized speed.
    Speed,
    Attack,
    Defense,
    Magic,
    Resilience,
    /// Contested against [`StatKind::Evasion`] for hit chance.
    Accuracy,
    Evasion,
    /// Contested against [`StatKind::Resolve`] for effect-package success.
    Potency,
    Resolve,
}

impl StatKind {
    pub const COUNT: usize = 11;

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Base values for every [`StatKind`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatBlock {
    values: [f32; StatKind::COUNT],
}

impl StatBlock {
    /// Create a block where every stat has the same value.
    pub fn uniform(value: f32) -> Self {
        Self {
            values: [value; StatKind::COUNT],
        }
    }

    pub fn get(&self, stat: StatKind) -> f32 {
        self.values[stat.index()]
    }

    pub fn set(&mut self, stat: StatKind, value: f32) {
        self.values[stat.index()] = value;
    }

    /// Builder: set a single stat.
    pub fn with(mut self, stat: StatKind, value: f32) -> Self {
        self.set(stat, value);
        self
    }
}

impl Default for StatBlock {
    /// Default stats: every combat stat at 10, 100 health, 50 stamina.
    fn default() -> Self {
        Self::uniform(10.0)
            .with(StatKind::MaxHealth, 100.0)
            .with(StatKind::MaxStamina, 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn count_matches_variants() {
        assert_eq!(StatKind::iter().count(), StatKind::COUNT);
        for (i, stat) in StatKind::iter().enumerate() {
            assert_eq!(stat.index(), i);
        }
    }

    #[test]
    fn builder_overrides_single_stat() {
        let block = StatBlock::default().with(StatKind::Speed, 25.0);
        assert_eq!(block.get(StatKind::Speed), 25.0);
        assert_eq!(block.get(StatKind::Attack), 10.0);
        assert_eq!(block.get(StatKind::MaxHealth), 100.0);
    }
}
