//! Roster - every combatant taking part in one battle.

use super::{Combatant, CombatantId, Side};
use crate::battle::BattleOutcome;
use crate::combat::Resistances;
use crate::error::PreconditionError;
use crate::stats::{Stance, StatBlock, StatKind, normalized_speed};

/// Roster entry a combatant is created from at battle start.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSpec {
    pub name: String,
    pub side: Side,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: StatBlock,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stance: Option<Stance>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resistances: Resistances,
    /// Starting health; `None` starts at maximum.
    #[cfg_attr(feature = "serde", serde(default))]
    pub health: Option<i32>,
}

impl CombatantSpec {
    pub fn new(name: impl Into<String>, side: Side) -> Self {
        Self {
            name: name.into(),
            side,
            stats: StatBlock::default(),
            stance: None,
            resistances: Resistances::default(),
            health: None,
        }
    }

    pub fn with_stats(mut self, stats: StatBlock) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_stat(mut self, stat: StatKind, value: f32) -> Self {
        self.stats.set(stat, value);
        self
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = Some(stance);
        self
    }

    pub fn with_resistances(mut self, resistances: Resistances) -> Self {
        self.resistances = resistances;
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = Some(health);
        self
    }
}

/// All combatants of one battle, indexed by [`CombatantId`].
///
/// Combatants are never removed; dead ones stay in the roster so reports and
/// presentation can still refer to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    combatants: Vec<Combatant>,
}

impl Roster {
    /// Creates combatants from roster entries, assigning ids in order.
    pub fn new(specs: impl IntoIterator<Item = CombatantSpec>) -> Self {
        let combatants = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Combatant::from_spec(CombatantId(i as u32), spec))
            .collect();
        Self { combatants }
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id.0 as usize)
    }

    /// Looks up a combatant that must exist.
    pub fn require(&self, id: CombatantId) -> Result<&Combatant, PreconditionError> {
        self.get(id).ok_or(PreconditionError::UnknownCombatant(id))
    }

    /// Looks up a combatant that must exist and be alive.
    pub fn require_living(&self, id: CombatantId) -> Result<&Combatant, PreconditionError> {
        let combatant = self.require(id)?;
        if combatant.is_alive() {
            Ok(combatant)
        } else {
            Err(PreconditionError::DeadCombatant(id))
        }
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(Combatant::is_alive)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    pub fn living(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| c.is_alive())
    }

    pub fn living_ids(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.living().map(Combatant::id)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Mean effective speed of the living combatants.
    pub fn normalized_speed(&self) -> f32 {
        normalized_speed(self.living().map(|c| c.stat(StatKind::Speed)))
    }

    /// Won when no enemy is left standing, lost when no player combatant is.
    ///
    /// A battle where both sides fall at once counts as lost.
    pub fn outcome(&self) -> Option<BattleOutcome> {
        let side_alive = |side: Side| self.living().any(|c| c.side() == side);
        if !side_alive(Side::Player) {
            Some(BattleOutcome::Lost)
        } else if !side_alive(Side::Enemy) {
            Some(BattleOutcome::Won)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kill(roster: &mut Roster, id: CombatantId) {
        if let Some(c) = roster.get_mut(id) {
            c.apply_damage(1000);
        }
    }

    fn roster() -> Roster {
        Roster::new([
            CombatantSpec::new("hero", Side::Player).with_stat(StatKind::Speed, 12.0),
            CombatantSpec::new("slime", Side::Enemy).with_stat(StatKind::Speed, 6.0),
            CombatantSpec::new("bat", Side::Enemy).with_stat(StatKind::Speed, 18.0),
        ])
    }

    #[test]
    fn assigns_ids_in_order() {
        let roster = roster();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.get(CombatantId(2)).map(|c| c.name()), Some("bat"));
        assert!(roster.get(CombatantId(3)).is_none());
    }

    #[test]
    fn normalized_speed_tracks_living() {
        let mut roster = roster();
        assert_eq!(roster.normalized_speed(), 12.0);

        kill(&mut roster, CombatantId(2));
        assert_eq!(roster.normalized_speed(), 9.0);
    }

    #[test]
    fn outcome_is_decided_when_a_side_is_wiped() {
        let mut roster = roster();
        assert_eq!(roster.outcome(), None);

        kill(&mut roster, CombatantId(1));
        kill(&mut roster, CombatantId(2));
        assert_eq!(roster.outcome(), Some(BattleOutcome::Won));
    }

    #[test]
    fn require_living_rejects_dead_and_unknown() {
        let mut roster = roster();
        kill(&mut roster, CombatantId(1));

        assert_eq!(
            roster.require_living(CombatantId(1)).err(),
            Some(PreconditionError::DeadCombatant(CombatantId(1)))
        );
        assert_eq!(
            roster.require_living(CombatantId(9)).err(),
            Some(PreconditionError::UnknownCombatant(CombatantId(9)))
        );
    }
}
