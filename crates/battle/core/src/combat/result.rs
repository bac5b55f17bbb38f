//! Per-target resolution outcomes.
//!
//! Outcomes are first-class results consumed by presentation and AI layers;
//! none of them is an error.

/// Outcome of a sub-effect against one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TargetOutcome {
    /// Pure utility sub-effect: zero damage and zero accuracy.
    NotApplicable,
    /// The accuracy roll failed.
    Miss,
    /// The hit landed and changed the target's health (or was a non-damaging hit).
    HitOrHealed,
    /// The hit landed but had zero net effect.
    NoSell,
}

impl TargetOutcome {
    /// Whether the sub-effect reached the target (anything but a miss).
    pub fn landed(self) -> bool {
        !matches!(self, TargetOutcome::Miss)
    }

    /// Classify a target's outcome.
    ///
    /// - zero base damage and zero base accuracy → `NotApplicable`
    /// - roll failed → `Miss`
    /// - damaging sub-effect whose figure came out as zero → `NoSell`
    /// - otherwise → `HitOrHealed`
    pub fn classify(base_damage: f32, base_accuracy: f32, landed: bool, figure: i32) -> Self {
        if base_damage == 0.0 && base_accuracy == 0.0 {
            TargetOutcome::NotApplicable
        } else if !landed {
            TargetOutcome::Miss
        } else if base_damage != 0.0 && figure == 0 {
            TargetOutcome::NoSell
        } else {
            TargetOutcome::HitOrHealed
        }
    }
}

/// Outcome of an effect package against one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PackageOutcome {
    /// The modifier was applied.
    Success,
    /// The modifier was not applied.
    Failure,
    /// The modifier landed but only refreshed an identical active modifier.
    Partial,
    /// The target left the fight before the package resolved.
    NotApplicable,
}

impl PackageOutcome {
    /// Whether the package took hold on the target (fully or partially).
    pub fn succeeded(self) -> bool {
        matches!(self, PackageOutcome::Success | PackageOutcome::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utility_sub_effect_is_not_applicable() {
        assert_eq!(
            TargetOutcome::classify(0.0, 0.0, true, 0),
            TargetOutcome::NotApplicable
        );
    }

    #[test]
    fn failed_roll_is_miss() {
        assert_eq!(TargetOutcome::classify(10.0, 0.5, false, 10), TargetOutcome::Miss);
    }

    #[test]
    fn zero_figure_on_damaging_hit_is_no_sell() {
        assert_eq!(TargetOutcome::classify(10.0, 1.0, true, 0), TargetOutcome::NoSell);
    }

    #[test]
    fn non_damaging_hit_is_hit() {
        assert_eq!(
            TargetOutcome::classify(0.0, 1.0, true, 0),
            TargetOutcome::HitOrHealed
        );
        assert_eq!(
            TargetOutcome::classify(-5.0, 1.0, true, -5),
            TargetOutcome::HitOrHealed
        );
    }
}
