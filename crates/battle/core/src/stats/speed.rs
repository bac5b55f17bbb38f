//! Speed and Delay - how speed turns into timeline cost.
//!
//! Delay costs are relative to the whole battle rather than absolute: the
//! battle's normalized speed is the mean speed of the living combatants, and a
//! combatant's speed factor is its effective speed divided by that mean.
//!
//! Formulas:
//! - normalized_speed = mean(Speed of living combatants)
//! - speed_factor = max(Speed / normalized_speed, min_factor)
//! - delay_cost = base_delay / speed_factor

/// Mean of the given speeds.
///
/// Returns 1.0 when there are no speeds or the mean is not positive, so
/// callers can always divide by the result.
pub fn normalized_speed(speeds: impl IntoIterator<Item = f32>) -> f32 {
    let (sum, count) = speeds
        .into_iter()
        .fold((0.0_f32, 0_u32), |(sum, count), s| (sum + s, count + 1));

    if count == 0 {
        return 1.0;
    }
    let mean = sum / count as f32;
    if mean > 0.0 && mean.is_finite() {
        mean
    } else {
        1.0
    }
}

/// Speed relative to the battle, floored at `min_factor`.
///
/// # Examples
/// - speed 20 in a battle normalized at 10 → 2.0
/// - speed 5 in a battle normalized at 10 → 0.5
pub fn speed_factor(speed: f32, normalized: f32, min_factor: f32) -> f32 {
    let normalized = if normalized > 0.0 { normalized } else { 1.0 };
    let factor = speed / normalized;
    if factor.is_finite() {
        factor.max(min_factor)
    } else {
        min_factor
    }
}

/// Delay accrued for a nominal `base_delay` at the given speed factor.
///
/// Faster combatants (factor > 1) accrue less delay for the same nominal cost.
pub fn delay_cost(base_delay: f32, factor: f32) -> f32 {
    if factor > 0.0 {
        (base_delay / factor).max(0.0)
    } else {
        base_delay.max(0.0)
    }
}
