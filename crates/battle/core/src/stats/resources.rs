//! Resources - health and stamina pools.
//!
//! Maximum values come from the MaxHealth / MaxStamina stats when the
//! combatant is created; current values are game state and are mutated by
//! damage, healing and action costs.

/// Enum representing individual resource pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Health,
    Stamina,
}

/// Integer resource meter tracked per combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: i32,
    pub maximum: i32,
}

impl ResourceMeter {
    pub fn new(current: i32, maximum: i32) -> Self {
        Self {
            current: current.clamp(0, maximum.max(0)),
            maximum: maximum.max(0),
        }
    }

    /// A meter filled to its maximum.
    pub fn full(maximum: i32) -> Self {
        Self::new(maximum, maximum)
    }

    /// Subtracts `amount` (negative restores), clamped to `[0, maximum]`.
    ///
    /// Returns the amount actually removed (negative when restored).
    pub fn drain(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.current = before.saturating_sub(amount).clamp(0, self.maximum);
        before - self.current
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0
    }

    /// Current value as a fraction of the maximum.
    pub fn ratio(&self) -> f32 {
        if self.maximum == 0 {
            0.0
        } else {
            self.current as f32 / self.maximum as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_clamps_at_zero() {
        let mut meter = ResourceMeter::full(30);
        assert_eq!(meter.drain(50), 30);
        assert!(meter.is_empty());
    }

    #[test]
    fn restore_clamps_at_maximum() {
        let mut meter = ResourceMeter::new(25, 30);
        assert_eq!(meter.drain(-10), -5);
        assert_eq!(meter.current, 30);
    }

    #[test]
    fn construction_clamps_current() {
        let meter = ResourceMeter::new(999, 40);
        assert_eq!(meter.current, 40);
        assert_eq!(meter.ratio(), 1.0);
    }
}
