//! Bonus application system following the layered stack architecture.
//!
//! Every effective stat is computed with the same calculation order:
//! Flat → %Inc → More → Less → Clamp
//!
//! Stance bonuses and active-modifier contributions both feed a single
//! [`BonusStack`] per stat, so a stance multiplier and a buff multiplier
//! compose exactly like two buffs would.

/// A single bonus that can be applied to a stat value.
///
/// - **Flat**: Additive bonuses applied first (e.g., +5 Attack from a stance)
/// - **Increased**: Percentage increases, summed then multiplied (e.g., +20%)
/// - **More**: Sequential multipliers applied individually (e.g., 50 = ×1.5)
/// - **Less**: Sequential reductions applied individually (e.g., 10 = ×0.9)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus {
    /// Flat additive bonus (applied first)
    Flat(f32),

    /// Percentage increase (summed with other %Inc, then multiplied)
    Increased(f32),

    /// Multiplicative "more" modifier (applied sequentially)
    More(f32),

    /// Multiplicative "less" modifier (applied sequentially)
    Less(f32),
}

impl Bonus {
    /// Create a flat bonus
    pub fn flat(value: f32) -> Self {
        Bonus::Flat(value)
    }

    /// Create a percentage increase bonus (20 = +20%)
    pub fn increased(percent: f32) -> Self {
        Bonus::Increased(percent)
    }

    /// Create a "more" multiplier (50 = ×1.5)
    pub fn more(percent: f32) -> Self {
        Bonus::More(percent)
    }

    /// Create a "less" multiplier (10 = ×0.9)
    pub fn less(percent: f32) -> Self {
        Bonus::Less(percent)
    }

    /// Returns the raw number carried by this bonus.
    pub fn value(&self) -> f32 {
        match *self {
            Bonus::Flat(v) | Bonus::Increased(v) | Bonus::More(v) | Bonus::Less(v) => v,
        }
    }
}

/// A collection of bonuses that will be applied in the correct order.
///
/// The stack guarantees the following application order:
/// 1. Flat bonuses (summed)
/// 2. Increased bonuses (summed, then multiplied)
/// 3. More multipliers (applied sequentially)
/// 4. Less multipliers (applied sequentially)
/// 5. Clamp to bounds
///
/// # Example
/// ```
/// # use battle_core::stats::{Bonus, BonusStack};
/// let mut stack = BonusStack::new();
/// stack.add(Bonus::flat(5.0));
/// stack.add(Bonus::increased(20.0));
/// stack.add(Bonus::increased(15.0));
/// stack.add(Bonus::more(50.0));
/// stack.add(Bonus::less(10.0));
///
/// let result = stack.apply(10.0, 0.0, 100.0);
/// // = clamp((10 + 5) × 1.35 × 1.5 × 0.9, 0, 100)
/// assert!((result - 27.3375).abs() < 1e-3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BonusStack {
    bonuses: Vec<Bonus>,
}

impl BonusStack {
    /// Create a new empty bonus stack
    pub fn new() -> Self {
        Self {
            bonuses: Vec::new(),
        }
    }

    /// Add a bonus to the stack
    pub fn add(&mut self, bonus: Bonus) {
        self.bonuses.push(bonus);
    }

    /// Add multiple bonuses at once
    pub fn extend(&mut self, bonuses: impl IntoIterator<Item = Bonus>) {
        self.bonuses.extend(bonuses);
    }

    /// Apply all bonuses to a base value with clamping
    ///
    /// # Formula
    /// ```text
    /// result = clamp((base + flat_sum) × (1 + inc_sum/100) × more_product × less_product, min, max)
    /// ```
    pub fn apply(&self, base: f32, min: f32, max: f32) -> f32 {
        let flat_sum: f32 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Flat(v) => Some(*v),
                _ => None,
            })
            .sum();

        let inc_sum: f32 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Increased(p) => Some(*p),
                _ => None,
            })
            .sum();

        let after_inc = (base + flat_sum) * (1.0 + inc_sum / 100.0);

        let after_more = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::More(p) => Some(*p),
                _ => None,
            })
            .fold(after_inc, |acc, more_percent| acc * (1.0 + more_percent / 100.0));

        let after_less = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Less(p) => Some(*p),
                _ => None,
            })
            .fold(after_more, |acc, less_percent| acc * (1.0 - less_percent / 100.0));

        after_less.clamp(min, max)
    }

    /// Apply bonuses with the default stat bounds.
    pub fn apply_stat(&self, base: f32) -> f32 {
        let bounds = StatBounds::STATS;
        self.apply(base, bounds.min, bounds.max)
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    /// Get the number of bonuses in the stack
    pub fn len(&self) -> usize {
        self.bonuses.len()
    }
}

/// Builder for constructing bonus stacks fluently
impl BonusStack {
    /// Add a flat bonus (builder pattern)
    pub fn flat(mut self, value: f32) -> Self {
        self.add(Bonus::flat(value));
        self
    }

    /// Add a percentage increase (builder pattern)
    pub fn increased(mut self, percent: f32) -> Self {
        self.add(Bonus::increased(percent));
        self
    }

    /// Add a "more" multiplier (builder pattern)
    pub fn more(mut self, percent: f32) -> Self {
        self.add(Bonus::more(percent));
        self
    }

    /// Add a "less" multiplier (builder pattern)
    pub fn less(mut self, percent: f32) -> Self {
        self.add(Bonus::less(percent));
        self
    }
}

/// Clamp bounds for effective stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatBounds {
    pub min: f32,
    pub max: f32,
}

impl StatBounds {
    /// Effective stats never go negative, and stay well clear of float overflow.
    pub const STATS: Self = Self {
        min: 0.0,
        max: 1.0e6,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_flat_before_percentages() {
        let stack = BonusStack::new().flat(10.0).increased(50.0);
        assert_eq!(stack.apply_stat(10.0), 30.0);
    }

    #[test]
    fn more_and_less_compose_multiplicatively() {
        let stack = BonusStack::new().more(100.0).less(50.0);
        assert_eq!(stack.apply_stat(40.0), 40.0);
    }

    #[test]
    fn clamps_to_zero() {
        let stack = BonusStack::new().flat(-50.0);
        assert_eq!(stack.apply_stat(10.0), 0.0);
    }
}
