//! Combatant model.
//!
//! A combatant holds base stats, the active stance and modifiers, its health
//! and stamina pools, its scheduling delay and its side affiliation. All
//! derived values are recomputed on query.
//!
//! # Invariants
//!
//! - `alive` is false exactly when health reached zero
//! - a dead combatant carries no modifiers and receives no further effects

mod roster;

pub use roster::{CombatantSpec, Roster};

use std::fmt;

use crate::combat::Resistances;
use crate::stats::{
    ActiveModifier, BonusStack, ModifierApplication, ModifierSet, ResourceMeter, Stance,
    StatBlock, StatKind, TickReport,
};

/// Unique identifier for a combatant within one battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side affiliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
    Neutral,
}

/// How a target relates to the combatant using an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    User,
    Ally,
    Enemy,
    Neutral,
}

/// Result of applying a damage figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageApplied {
    /// Health actually removed (negative when healed).
    pub dealt: i32,
    /// The combatant died from this application.
    pub died: bool,
}

/// Runtime state of one combatant.
#[derive(Clone, Debug, PartialEq)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    side: Side,
    base: StatBlock,
    stance: Option<Stance>,
    resistances: Resistances,
    modifiers: ModifierSet,
    health: ResourceMeter,
    stamina: ResourceMeter,
    delay: f32,
    alive: bool,
}

impl Combatant {
    /// Builds a combatant from a roster entry.
    pub fn from_spec(id: CombatantId, spec: CombatantSpec) -> Self {
        let max_health = spec.stats.get(StatKind::MaxHealth).round().max(1.0) as i32;
        let max_stamina = spec.stats.get(StatKind::MaxStamina).round().max(0.0) as i32;
        let health = match spec.health {
            Some(current) => ResourceMeter::new(current, max_health),
            None => ResourceMeter::full(max_health),
        };

        Self {
            id,
            name: spec.name,
            side: spec.side,
            base: spec.stats,
            stance: spec.stance,
            resistances: spec.resistances,
            modifiers: ModifierSet::new(),
            alive: !health.is_empty(),
            health,
            stamina: ResourceMeter::full(max_stamina),
            delay: 0.0,
        }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn health(&self) -> ResourceMeter {
        self.health
    }

    pub fn stamina(&self) -> ResourceMeter {
        self.stamina
    }

    pub fn resistances(&self) -> &Resistances {
        &self.resistances
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    pub fn stance(&self) -> Option<&Stance> {
        self.stance.as_ref()
    }

    pub fn base_stats(&self) -> &StatBlock {
        &self.base
    }

    // ========================================================================
    // Derived Stats
    // ========================================================================

    /// Effective value of `stat`: base, then stance bonuses, then modifiers.
    pub fn stat(&self, stat: StatKind) -> f32 {
        let mut stack = BonusStack::new();
        if let Some(stance) = &self.stance {
            stack.extend(stance.bonuses_for(stat));
        }
        stack.extend(self.modifiers.stat_bonuses(stat));
        stack.apply_stat(self.base.get(stat))
    }

    /// Effective value of an optional stat reference.
    pub fn stat_ref(&self, stat: Option<StatKind>) -> Option<f32> {
        stat.map(|s| self.stat(s))
    }

    /// How `target` relates to this combatant.
    pub fn relation_to(&self, target: &Combatant) -> Relation {
        if self.id == target.id {
            Relation::User
        } else if self.side == target.side {
            Relation::Ally
        } else if target.side == Side::Neutral {
            Relation::Neutral
        } else {
            Relation::Enemy
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Applies a signed damage figure: positive damages, negative heals.
    ///
    /// Dead combatants are unaffected. Reaching zero health kills the combatant
    /// and clears its modifiers.
    pub fn apply_damage(&mut self, amount: i32) -> DamageApplied {
        if !self.alive {
            return DamageApplied::default();
        }

        let dealt = self.health.drain(amount);
        let died = self.health.is_empty();
        if died {
            self.alive = false;
            self.modifiers.clear();
        }
        DamageApplied { dealt, died }
    }

    /// Spends stamina; returns false (and spends nothing) when the pool is short.
    pub fn spend_stamina(&mut self, amount: i32) -> bool {
        if amount > self.stamina.current {
            return false;
        }
        self.stamina.drain(amount);
        true
    }

    /// Shifts stamina by a signed amount (positive drains), clamped to the pool.
    pub fn shift_stamina(&mut self, amount: i32) -> i32 {
        self.stamina.drain(amount)
    }

    /// Adds a modifier. Returns `None` when the combatant is dead.
    pub fn apply_modifier(&mut self, modifier: ActiveModifier) -> Option<ModifierApplication> {
        self.alive.then(|| self.modifiers.apply(modifier))
    }

    /// Resolves one tick of modifiers and applies the net health change.
    pub fn tick_modifiers(&mut self) -> (TickReport, DamageApplied) {
        let report = self.modifiers.tick();
        let applied = self.apply_damage(report.health_delta);
        (report, applied)
    }

    pub fn set_stance(&mut self, stance: Option<Stance>) {
        self.stance = stance;
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn set_delay(&mut self, delay: f32) {
        self.delay = delay.max(0.0);
    }

    pub fn add_delay(&mut self, delay: f32) {
        self.set_delay(self.delay + delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Bonus, ModifierKind};

    fn fighter(side: Side) -> Combatant {
        Combatant::from_spec(CombatantId(0), CombatantSpec::new("fighter", side))
    }

    #[test]
    fn stance_and_modifiers_compose() {
        let mut c = Combatant::from_spec(
            CombatantId(0),
            CombatantSpec::new("fighter", Side::Player)
                .with_stance(Stance::new("guard").with_bonus(StatKind::Defense, Bonus::more(50.0))),
        );
        c.apply_modifier(ActiveModifier {
            source: CombatantId(1),
            kind: ModifierKind::Stat {
                stat: StatKind::Defense,
                bonus: Bonus::flat(10.0),
            },
            remaining: 2,
        });

        // (10 + 10) × 1.5
        assert_eq!(c.stat(StatKind::Defense), 30.0);
        assert_eq!(c.stat(StatKind::Attack), 10.0);
    }

    #[test]
    fn lethal_damage_kills_and_clears_modifiers() {
        let mut c = fighter(Side::Enemy);
        c.apply_modifier(ActiveModifier {
            source: CombatantId(1),
            kind: ModifierKind::Stat {
                stat: StatKind::Speed,
                bonus: Bonus::flat(1.0),
            },
            remaining: 3,
        });

        let applied = c.apply_damage(250);
        assert_eq!(applied.dealt, 100);
        assert!(applied.died);
        assert!(!c.is_alive());
        assert!(c.modifiers().is_empty());

        // Dead combatants are not healed back.
        assert_eq!(c.apply_damage(-50).dealt, 0);
        assert!(!c.is_alive());
    }

    #[test]
    fn healing_is_capped_at_maximum() {
        let mut c = fighter(Side::Player);
        c.apply_damage(30);
        assert_eq!(c.apply_damage(-50).dealt, -30);
        assert_eq!(c.health().current, 100);
    }

    #[test]
    fn stamina_is_not_overspent() {
        let mut c = fighter(Side::Player);
        assert!(c.spend_stamina(20));
        assert!(!c.spend_stamina(31));
        assert_eq!(c.stamina().current, 30);
    }

    #[test]
    fn relations_follow_sides() {
        let hero = fighter(Side::Player);
        let ally = Combatant::from_spec(CombatantId(1), CombatantSpec::new("ally", Side::Player));
        let foe = Combatant::from_spec(CombatantId(2), CombatantSpec::new("foe", Side::Enemy));
        let bystander =
            Combatant::from_spec(CombatantId(3), CombatantSpec::new("crowd", Side::Neutral));

        assert_eq!(hero.relation_to(&hero), Relation::User);
        assert_eq!(hero.relation_to(&ally), Relation::Ally);
        assert_eq!(hero.relation_to(&foe), Relation::Enemy);
        assert_eq!(hero.relation_to(&bystander), Relation::Neutral);
    }
}
