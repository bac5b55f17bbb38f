//! Action definitions as supplied by an external loader.
//!
//! These types are plain data: names cross-reference each other and nothing
//! is validated until [`ActionDefinition::compile`] turns a definition into a
//! [`CompiledAction`](super::CompiledAction).

use super::targeting::{TargetSets, TargetShape, TargetSides};
use crate::combat::DamageType;
use crate::stats::{StatKind, StatusKind};
use crate::sync::EventBlock;

/// Base costs paid for using an action.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionCosts {
    /// Deducted from the user when the action begins.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stamina: i32,
    /// Reach of the action; interpreted by the target-acquisition layer.
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: u32,
    /// Nominal delay added to the user when its turn ends.
    #[cfg_attr(feature = "serde", serde(default))]
    pub delay: f32,
}

/// Numeric payload of an effect package. Float and integral storage are
/// mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Magnitude {
    Float(f32),
    Integral(i32),
}

impl Magnitude {
    pub fn variant_name(self) -> &'static str {
        match self {
            Magnitude::Float(_) => "float",
            Magnitude::Integral(_) => "integral",
        }
    }
}

/// What an effect package does to a target it succeeds on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    /// Buff or debuff. Float magnitude is a percentage multiplier, integral a
    /// flat bonus.
    StatModifier { stat: StatKind, duration: u32 },
    /// Status with an integral potency.
    Status { status: StatusKind, duration: u32 },
    /// Pushes the target back in the turn order. Integral magnitude is a flat
    /// delay, float magnitude a fraction of the target's current delay.
    Knockback,
    /// Drains (positive) or restores (negative) an integral amount of stamina.
    StaminaShift,
}

impl EffectKind {
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::StatModifier { .. } => "stat_modifier",
            EffectKind::Status { .. } => "status",
            EffectKind::Knockback => "knockback",
            EffectKind::StaminaShift => "stamina_shift",
        }
    }

    /// Whether `magnitude` is a valid payload for this kind.
    pub fn accepts(self, magnitude: Magnitude) -> bool {
        match self {
            EffectKind::StatModifier { .. } | EffectKind::Knockback => true,
            EffectKind::Status { .. } | EffectKind::StaminaShift => {
                matches!(magnitude, Magnitude::Integral(_))
            }
        }
    }
}

/// Attacker/defender stat pair scaling a roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatContest {
    pub attacker: StatKind,
    pub defender: StatKind,
}

/// A non-damage modifier attached to a sub-effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectPackageDefinition {
    pub kind: EffectKind,
    pub magnitude: Magnitude,
    pub success_rate: f32,
    /// Roll even against targets the sub-effect missed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub apply_on_miss: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub contest: Option<StatContest>,
    /// Index of an earlier package in the same sub-effect whose success this
    /// one copies instead of rolling.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tie_success_to: Option<usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub events: Option<EventBlock>,
}

impl EffectPackageDefinition {
    pub fn new(kind: EffectKind, magnitude: Magnitude) -> Self {
        Self {
            kind,
            magnitude,
            success_rate: 1.0,
            apply_on_miss: false,
            contest: None,
            tie_success_to: None,
            events: None,
        }
    }

    pub fn with_success_rate(mut self, rate: f32) -> Self {
        self.success_rate = rate;
        self
    }

    pub fn applying_on_miss(mut self) -> Self {
        self.apply_on_miss = true;
        self
    }

    pub fn with_contest(mut self, attacker: StatKind, defender: StatKind) -> Self {
        self.contest = Some(StatContest { attacker, defender });
        self
    }

    pub fn tied_to(mut self, package: usize) -> Self {
        self.tie_success_to = Some(package);
        self
    }

    pub fn with_events(mut self, events: EventBlock) -> Self {
        self.events = Some(events);
        self
    }
}

/// One ordered step of an action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubEffectDefinition {
    /// Unique within the action.
    pub name: String,
    pub targets: TargetSets,
    /// Signed base magnitude: positive damages, negative heals, zero is
    /// non-damaging.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_accuracy"))]
    pub accuracy: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_types: Vec<DamageType>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attack_stat: Option<StatKind>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub defense_stat: Option<StatKind>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hit_stat: Option<StatKind>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub evade_stat: Option<StatKind>,
    /// Earlier sub-effect whose damage figures this one copies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_determinant: Option<String>,
    /// Earlier sub-effect whose hit/miss outcomes this one copies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub success_determinant: Option<String>,
    /// Earlier sub-effect that must have executed and landed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub predicate: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub packages: Vec<EffectPackageDefinition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub events: Option<EventBlock>,
}

#[cfg(feature = "serde")]
fn default_accuracy() -> f32 {
    1.0
}

impl SubEffectDefinition {
    pub fn new(name: impl Into<String>, targets: TargetSets) -> Self {
        Self {
            name: name.into(),
            targets,
            damage: 0.0,
            accuracy: 1.0,
            damage_types: Vec::new(),
            attack_stat: None,
            defense_stat: None,
            hit_stat: None,
            evade_stat: None,
            damage_determinant: None,
            success_determinant: None,
            predicate: None,
            packages: Vec::new(),
            events: None,
        }
    }

    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_damage_types(mut self, types: impl IntoIterator<Item = DamageType>) -> Self {
        self.damage_types = types.into_iter().collect();
        self
    }

    /// Scales damage by `attack / defense`.
    pub fn scaled_by(mut self, attack: StatKind, defense: StatKind) -> Self {
        self.attack_stat = Some(attack);
        self.defense_stat = Some(defense);
        self
    }

    /// Scales accuracy by `hit / evade`.
    pub fn contested_by(mut self, hit: StatKind, evade: StatKind) -> Self {
        self.hit_stat = Some(hit);
        self.evade_stat = Some(evade);
        self
    }

    pub fn with_damage_determinant(mut self, name: impl Into<String>) -> Self {
        self.damage_determinant = Some(name.into());
        self
    }

    pub fn with_success_determinant(mut self, name: impl Into<String>) -> Self {
        self.success_determinant = Some(name.into());
        self
    }

    pub fn with_predicate(mut self, name: impl Into<String>) -> Self {
        self.predicate = Some(name.into());
        self
    }

    pub fn with_package(mut self, package: EffectPackageDefinition) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_events(mut self, events: EventBlock) -> Self {
        self.events = Some(events);
        self
    }
}

/// Immutable action template.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDefinition {
    pub name: String,
    pub shape: TargetShape,
    pub sides: TargetSides,
    #[cfg_attr(feature = "serde", serde(default))]
    pub costs: ActionCosts,
    pub sub_effects: Vec<SubEffectDefinition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_start: EventBlock,
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_conclusion: EventBlock,
    /// Abbreviated conclusion used when fast-forwarding or interrupted.
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_skip: EventBlock,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, shape: TargetShape, sides: TargetSides) -> Self {
        Self {
            name: name.into(),
            shape,
            sides,
            costs: ActionCosts::default(),
            sub_effects: Vec::new(),
            on_start: EventBlock::default(),
            on_conclusion: EventBlock::default(),
            on_skip: EventBlock::default(),
        }
    }

    pub fn with_costs(mut self, costs: ActionCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_sub_effect(mut self, sub_effect: SubEffectDefinition) -> Self {
        self.sub_effects.push(sub_effect);
        self
    }

    pub fn with_on_start(mut self, block: EventBlock) -> Self {
        self.on_start = block;
        self
    }

    pub fn with_on_conclusion(mut self, block: EventBlock) -> Self {
        self.on_conclusion = block;
        self
    }

    pub fn with_on_skip(mut self, block: EventBlock) -> Self {
        self.on_skip = block;
        self
    }
}
