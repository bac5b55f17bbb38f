//! Hit chance and contested success calculations.

/// Contested chance of a base rate against an attacker/defender stat pair.
///
/// # Formula
///
/// ```text
/// chance = base × (attacker / defender)   when both stats are defined and defender > 0
/// chance = base                           otherwise
/// clamped to [0, 1]
/// ```
///
/// The same contest drives sub-effect accuracy (Accuracy vs Evasion) and
/// effect-package success (Potency vs Resolve).
pub fn contested_chance(base: f32, attacker: Option<f32>, defender: Option<f32>) -> f32 {
    let chance = match (attacker, defender) {
        (Some(attacker), Some(defender)) if defender > 0.0 => base * (attacker / defender),
        _ => base,
    };

    if chance.is_nan() {
        return 0.0;
    }
    chance.clamp(0.0, 1.0)
}

/// Check a roll in `[0, 1)` against a chance.
///
/// A chance of 1.0 always succeeds, a chance of 0.0 never does.
pub fn check_roll(chance: f32, roll: f32) -> bool {
    roll < chance
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uses_base_when_a_stat_is_missing() {
        assert_eq!(contested_chance(0.7, Some(50.0), None), 0.7);
        assert_eq!(contested_chance(0.7, None, Some(50.0)), 0.7);
    }

    #[test]
    fn scales_by_stat_ratio_and_caps_at_one() {
        assert_eq!(contested_chance(0.5, Some(10.0), Some(20.0)), 0.25);
        assert_eq!(contested_chance(0.9, Some(30.0), Some(10.0)), 1.0);
    }

    #[test]
    fn zero_evasion_falls_back_to_base() {
        assert_eq!(contested_chance(0.8, Some(10.0), Some(0.0)), 0.8);
    }

    #[test]
    fn certain_and_impossible_rolls() {
        assert!(check_roll(1.0, 0.999_999));
        assert!(!check_roll(0.0, 0.0));
    }

    proptest! {
        #[test]
        fn chance_is_always_clamped(
            base in -10.0f32..10.0,
            attacker in proptest::option::of(-1000.0f32..1000.0),
            defender in proptest::option::of(-1000.0f32..1000.0),
        ) {
            let chance = contested_chance(base, attacker, defender);
            prop_assert!((0.0..=1.0).contains(&chance));
        }
    }
}
