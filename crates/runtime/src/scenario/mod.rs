//! Scenario files: the roster and the action catalogue of one battle.
//!
//! Scenarios are plain RON data. Loading one compiles every action up front,
//! so a malformed definition fails the load instead of surfacing mid-battle.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use battle_core::{ActionDefinition, Battle, BattleConfig, CombatantSpec, CompiledAction};
use serde::{Deserialize, Serialize};

use crate::api::{Result, RuntimeError};

/// Roster entries and action definitions for one battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub combatants: Vec<CombatantSpec>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl Scenario {
    pub fn new(combatants: Vec<CombatantSpec>, actions: Vec<ActionDefinition>) -> Self {
        Self {
            combatants,
            actions,
        }
    }

    /// Parses a scenario from RON text.
    pub fn from_ron(content: &str) -> Result<Self> {
        ron::from_str(content).map_err(|e| {
            RuntimeError::InvalidScenario(format!("failed to parse scenario RON: {}", e))
        })
    }

    /// Load scenario from a RON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::InvalidScenario(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_ron(&content)
    }

    /// Compiles every action, failing on the first invalid definition.
    pub fn compile_actions(&self) -> Result<ActionLibrary> {
        let mut library = ActionLibrary::default();
        for definition in &self.actions {
            let compiled = definition
                .compile()
                .map_err(|source| RuntimeError::Definition {
                    action: definition.name.clone(),
                    source,
                })?;
            if library.insert(compiled).is_some() {
                return Err(RuntimeError::InvalidScenario(format!(
                    "action '{}' is defined twice",
                    definition.name
                )));
            }
        }
        tracing::info!(
            target: "runtime::scenario",
            combatants = self.combatants.len(),
            actions = library.len(),
            "scenario compiled"
        );
        Ok(library)
    }

    /// Builds an unstarted battle over this scenario's roster.
    pub fn create_battle(&self, config: BattleConfig) -> Result<Battle> {
        Ok(Battle::new(self.combatants.iter().cloned(), config)?)
    }
}

/// Compiled actions by name.
#[derive(Clone, Debug, Default)]
pub struct ActionLibrary {
    actions: HashMap<String, Arc<CompiledAction>>,
}

impl ActionLibrary {
    /// Adds a compiled action, returning the one it replaced.
    pub fn insert(&mut self, action: CompiledAction) -> Option<Arc<CompiledAction>> {
        self.actions.insert(action.name.clone(), Arc::new(action))
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledAction>> {
        self.actions.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
