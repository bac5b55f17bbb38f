//! Stances - named sets of stat bonuses a combatant fights in.
//!
//! A stance contributes flat bonuses and multipliers to the same bonus stack
//! as active modifiers. Stances are immutable definition data; switching
//! stance replaces the whole set.

use super::bonus::Bonus;
use super::core::StatKind;
use crate::error::DefinitionError;

/// One stat bonus carried by a stance.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StanceBonus {
    pub stat: StatKind,
    pub bonus: Bonus,
}

/// A named stance definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stance {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bonuses: Vec<StanceBonus>,
}

impl Stance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bonuses: Vec::new(),
        }
    }

    /// Builder: add a bonus to a stat.
    pub fn with_bonus(mut self, stat: StatKind, bonus: Bonus) -> Self {
        self.bonuses.push(StanceBonus { stat, bonus });
        self
    }

    /// Bonuses this stance contributes to `stat`.
    pub fn bonuses_for(&self, stat: StatKind) -> impl Iterator<Item = Bonus> + '_ {
        self.bonuses
            .iter()
            .filter(move |b| b.stat == stat)
            .map(|b| b.bonus)
    }

    /// Rejects stances carrying non-finite bonus values.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        match self.bonuses.iter().find(|b| !b.bonus.value().is_finite()) {
            Some(bad) => Err(DefinitionError::InvalidStanceBonus {
                stance: self.name.clone(),
                stat: bad.stat.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_bonuses_by_stat() {
        let stance = Stance::new("aggressive")
            .with_bonus(StatKind::Attack, Bonus::more(25.0))
            .with_bonus(StatKind::Defense, Bonus::less(20.0))
            .with_bonus(StatKind::Attack, Bonus::flat(2.0));

        let attack: Vec<_> = stance.bonuses_for(StatKind::Attack).collect();
        assert_eq!(attack, vec![Bonus::more(25.0), Bonus::flat(2.0)]);
        assert_eq!(stance.bonuses_for(StatKind::Speed).count(), 0);
    }

    #[test]
    fn rejects_non_finite_bonus() {
        let stance = Stance::new("broken").with_bonus(StatKind::Speed, Bonus::flat(f32::NAN));
        assert!(matches!(
            stance.validate(),
            Err(DefinitionError::InvalidStanceBonus { .. })
        ));
    }
}
