//! Stat System - base values, stance bonuses and active modifiers.
//!
//! # Architecture
//!
//! ```text
//! [ Base Stats ]            stored per combatant
//!      ↓
//! [ Stance Bonuses ]        definition data
//!      ↓
//! [ Active Modifiers ]      runtime residue of effect packages
//!      ↓
//! [ Effective Stat ]        recomputed on every query
//! ```
//!
//! ## Bonus Stack
//!
//! All contributions use the same calculation order:
//! `Flat → %Inc → More → Less → Clamp`

pub mod bonus;
pub mod core;
pub mod modifiers;
pub mod resources;
pub mod speed;
pub mod stance;

// Re-export primary types
pub use bonus::{Bonus, BonusStack, StatBounds};
pub use core::{StatBlock, StatKind};
pub use modifiers::{
    ActiveModifier, ModifierApplication, ModifierKind, ModifierSet, StatusKind, TickReport,
};
pub use resources::{ResourceKind, ResourceMeter};
pub use speed::{delay_cost, normalized_speed, speed_factor};
pub use stance::{Stance, StanceBonus};
