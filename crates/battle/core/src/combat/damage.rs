//! Damage calculation and resistances.

// ============================================================================
// Damage Type
// ============================================================================

/// Damage type for resistances and damage calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DamageType {
    /// Physical damage (melee, projectiles).
    Physical,
    /// Fire damage (burns, explosions).
    Fire,
    /// Cold damage (ice, frost).
    Cold,
    /// Lightning damage (electricity, storms).
    Lightning,
    /// Poison damage (toxins, venom).
    Poison,
    /// Arcane damage (pure magic).
    Arcane,
    /// True damage (ignores per-type resistances, still subject to the global one).
    True,
}

impl DamageType {
    const COUNT: usize = 7;
}

// ============================================================================
// Resistances
// ============================================================================

/// Per-type resistance multipliers plus one global multiplier.
///
/// A multiplier of 1.0 means no resistance, 0.5 halves incoming damage, 0.0
/// makes the combatant immune and values above 1.0 are weaknesses.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resistances {
    per_type: [f32; DamageType::COUNT],
    global: f32,
}

impl Resistances {
    pub fn get(&self, damage_type: DamageType) -> f32 {
        match damage_type {
            DamageType::True => 1.0,
            other => self.per_type[other as usize],
        }
    }

    pub fn global(&self) -> f32 {
        self.global
    }

    /// Builder: set the multiplier for one damage type.
    pub fn with(mut self, damage_type: DamageType, multiplier: f32) -> Self {
        self.per_type[damage_type as usize] = multiplier;
        self
    }

    /// Builder: set the global multiplier.
    pub fn with_global(mut self, multiplier: f32) -> Self {
        self.global = multiplier;
        self
    }

    /// Combined multiplier for a hit carrying `types`.
    ///
    /// Each listed type multiplies the result; the global multiplier is applied
    /// exactly once on top.
    pub fn multiplier(&self, types: &[DamageType]) -> f32 {
        types
            .iter()
            .fold(self.global, |acc, &t| acc * self.get(t))
    }
}

impl Default for Resistances {
    fn default() -> Self {
        Self {
            per_type: [1.0; DamageType::COUNT],
            global: 1.0,
        }
    }
}

// ============================================================================
// Damage Calculation
// ============================================================================

/// Inputs for one attacker → defender damage figure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageInput<'a> {
    /// Signed base magnitude: positive damages, negative heals.
    pub base: f32,
    /// Attacker's effective attack stat, if the sub-effect names one.
    pub attack: Option<f32>,
    /// Defender's effective defense stat, if the sub-effect names one.
    pub defense: Option<f32>,
    pub types: &'a [DamageType],
}

/// Calculate the damage figure for one target.
///
/// # Formula
///
/// ```text
/// scaled = base × (attack / defense)     when both stats are defined and defense > 0
/// scaled = base × attack / 10            when only attack is defined (healing)
/// scaled = base                          otherwise
/// final  = round(scaled × resistance_multiplier)   for damage
/// final  = round(scaled)                           for healing
/// ```
///
/// Healing ignores resistances. The sign of the result always follows the
/// sign of `base`.
pub fn calculate_damage(input: DamageInput<'_>, resistances: &Resistances) -> i32 {
    if input.base == 0.0 {
        return 0;
    }

    let scaled = match (input.attack, input.defense) {
        (Some(attack), Some(defense)) if defense > 0.0 => input.base * (attack / defense),
        (Some(attack), None) if input.base < 0.0 => input.base * (attack / 10.0),
        _ => input.base,
    };

    let resisted = if input.base > 0.0 {
        scaled * resistances.multiplier(input.types)
    } else {
        scaled
    };

    let rounded = resisted.round();
    if !rounded.is_finite() {
        return 0;
    }
    let value = rounded as i32;
    if input.base > 0.0 {
        value.max(0)
    } else {
        value.min(0)
    }
}
