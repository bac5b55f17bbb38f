//! Combat resolution math.
//!
//! This module provides pure functions for resolving combat interactions.
//! Randomness is supplied by the caller as a roll, so every function here is
//! deterministic and side-effect free.
//!
//! # Core Functions
//!
//! - `contested_chance`: base rate scaled by an attacker/defender stat ratio, clamped to [0, 1]
//! - `calculate_damage`: signed damage figure with attack/defense scaling and resistances
//! - `TargetOutcome::classify`: not-applicable / miss / hit-or-healed / no-sell

pub mod damage;
pub mod hit;
pub mod result;

pub use damage::{DamageInput, DamageType, Resistances, calculate_damage};
pub use hit::{check_roll, contested_chance};
pub use result::{PackageOutcome, TargetOutcome};
