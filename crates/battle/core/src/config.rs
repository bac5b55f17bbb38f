/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Seed for the battle's random stream (accuracy rolls, effect rolls, tie-break shuffles).
    pub seed: u64,

    /// Nominal delay every combatant starts with, scaled by its speed factor.
    pub initial_delay: f32,

    /// Lower bound for a combatant's speed factor, so a zero-speed combatant still progresses.
    pub min_speed_factor: f32,

    /// Delays at or below this value are snapped to zero when the scheduler advances.
    pub delay_epsilon: f32,

    /// Dispatch the abbreviated skip block instead of the concluding block.
    pub fast_forward: bool,

    /// Multiplier applied to knockback magnitudes before they are added to a target's delay.
    pub knockback_scale: f32,

    /// Nominal delay charged to a combatant that passes its turn.
    pub pass_delay: f32,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of simultaneously active modifiers per combatant.
    pub const MAX_MODIFIERS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SEED: u64 = 0x5eed_ba77_1e00_0001;
    pub const DEFAULT_INITIAL_DELAY: f32 = 100.0;
    pub const DEFAULT_MIN_SPEED_FACTOR: f32 = 0.1;
    pub const DEFAULT_DELAY_EPSILON: f32 = 1e-4;
    pub const DEFAULT_KNOCKBACK_SCALE: f32 = 1.0;
    pub const DEFAULT_PASS_DELAY: f32 = 50.0;

    pub fn new() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            min_speed_factor: Self::DEFAULT_MIN_SPEED_FACTOR,
            delay_epsilon: Self::DEFAULT_DELAY_EPSILON,
            fast_forward: false,
            knockback_scale: Self::DEFAULT_KNOCKBACK_SCALE,
            pass_delay: Self::DEFAULT_PASS_DELAY,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: f32) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_fast_forward(mut self, fast_forward: bool) -> Self {
        self.fast_forward = fast_forward;
        self
    }

    pub fn with_pass_delay(mut self, pass_delay: f32) -> Self {
        self.pass_delay = pass_delay;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
