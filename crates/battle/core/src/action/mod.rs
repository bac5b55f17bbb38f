//! Action domain - declarative actions resolved sub-effect by sub-effect.
//!
//! # Module Structure
//!
//! - `definition`: raw, loader-facing action data (names cross-reference)
//! - `compile`: load-time validation into an immutable [`CompiledAction`]
//! - `targeting`: shape, side eligibility and target-set flags
//! - `handle`: per-invocation runtime handles (action → sub-effect → package)
//! - `engine`: the resolution engine driving handles through event blocks
//! - `report`: outcome summary handed to presentation and AI layers

pub mod compile;
pub mod definition;
pub mod engine;
pub mod handle;
pub mod report;
pub mod targeting;

pub use compile::{CompiledAction, CompiledPackage, CompiledSubEffect};
pub use definition::{
    ActionCosts, ActionDefinition, EffectKind, EffectPackageDefinition, Magnitude, StatContest,
    SubEffectDefinition,
};
pub use engine::{ActionEngine, EngineContext, EngineProgress};
pub use handle::{ActionHandle, PackageHandle, SubEffectHandle, SubEffectState, TargetResult};
pub use report::{ActionReport, SubEffectReport, TargetReport, Termination};
pub use targeting::{TargetSets, TargetShape, TargetSides};
