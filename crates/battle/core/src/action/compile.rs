//! Load-time validation of action definitions.
//!
//! Compilation resolves every name reference to an index into the action's
//! sub-effect list and rejects anything the engine could not execute:
//!
//! - empty or duplicate names
//! - determinant and predicate references that are unknown, self or forward
//! - package ties that are out of range or not earlier
//! - accuracy and success rates outside `[0, 1]`, non-finite damage
//! - magnitudes of the wrong kind, duplicate event-layer priorities
//!
//! A [`CompiledAction`] is therefore safe to execute without runtime lookups.

use std::collections::HashMap;

use super::definition::{
    ActionCosts, ActionDefinition, EffectPackageDefinition, SubEffectDefinition,
};
use super::targeting::{TargetSets, TargetShape, TargetSides};
use crate::combat::DamageType;
use crate::error::{DefinitionError, ReferenceKind};
use crate::stats::StatKind;
use crate::sync::EventBlock;

/// Validated effect package.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPackage {
    pub definition: EffectPackageDefinition,
}

impl CompiledPackage {
    pub fn tie(&self) -> Option<usize> {
        self.definition.tie_success_to
    }
}

/// Validated sub-effect with resolved references.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledSubEffect {
    pub name: String,
    pub targets: TargetSets,
    pub damage: f32,
    pub accuracy: f32,
    pub damage_types: Vec<DamageType>,
    pub attack_stat: Option<StatKind>,
    pub defense_stat: Option<StatKind>,
    pub hit_stat: Option<StatKind>,
    pub evade_stat: Option<StatKind>,
    pub damage_determinant: Option<usize>,
    pub success_determinant: Option<usize>,
    pub predicate: Option<usize>,
    pub packages: Vec<CompiledPackage>,
    pub events: Option<EventBlock>,
}

/// Immutable, validated action ready for the resolution engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledAction {
    pub name: String,
    pub shape: TargetShape,
    pub sides: TargetSides,
    pub costs: ActionCosts,
    pub sub_effects: Vec<CompiledSubEffect>,
    pub on_start: EventBlock,
    pub on_conclusion: EventBlock,
    pub on_skip: EventBlock,
}

impl CompiledAction {
    /// Index of the sub-effect named `name`.
    pub fn sub_effect_index(&self, name: &str) -> Option<usize> {
        self.sub_effects.iter().position(|s| s.name == name)
    }
}

impl ActionDefinition {
    /// Validates the definition and resolves its name references.
    pub fn compile(&self) -> Result<CompiledAction, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyActionName);
        }

        let mut indices = HashMap::with_capacity(self.sub_effects.len());
        for (index, sub) in self.sub_effects.iter().enumerate() {
            if sub.name.trim().is_empty() {
                return Err(DefinitionError::EmptySubEffectName {
                    action: self.name.clone(),
                    index,
                });
            }
            if indices.insert(sub.name.as_str(), index).is_some() {
                return Err(DefinitionError::DuplicateSubEffect {
                    action: self.name.clone(),
                    name: sub.name.clone(),
                });
            }
        }

        let sub_effects = self
            .sub_effects
            .iter()
            .enumerate()
            .map(|(index, sub)| compile_sub_effect(index, sub, &indices))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledAction {
            name: self.name.clone(),
            shape: self.shape,
            sides: self.sides,
            costs: self.costs,
            sub_effects,
            on_start: compile_block(&self.on_start)?,
            on_conclusion: compile_block(&self.on_conclusion)?,
            on_skip: compile_block(&self.on_skip)?,
        })
    }
}

fn compile_block(block: &EventBlock) -> Result<EventBlock, DefinitionError> {
    block.validate()?;
    let mut block = block.clone();
    block.sort_layers();
    Ok(block)
}

fn resolve_reference(
    sub: &SubEffectDefinition,
    own_index: usize,
    kind: ReferenceKind,
    target: Option<&String>,
    indices: &HashMap<&str, usize>,
) -> Result<Option<usize>, DefinitionError> {
    let Some(target) = target else {
        return Ok(None);
    };

    if *target == sub.name {
        return Err(DefinitionError::SelfReference {
            sub_effect: sub.name.clone(),
            kind,
        });
    }

    match indices.get(target.as_str()) {
        None => Err(DefinitionError::UnknownReference {
            sub_effect: sub.name.clone(),
            kind,
            target: target.clone(),
        }),
        Some(&index) if index > own_index => Err(DefinitionError::ForwardReference {
            sub_effect: sub.name.clone(),
            kind,
            target: target.clone(),
        }),
        Some(&index) => Ok(Some(index)),
    }
}

fn compile_sub_effect(
    index: usize,
    sub: &SubEffectDefinition,
    indices: &HashMap<&str, usize>,
) -> Result<CompiledSubEffect, DefinitionError> {
    if sub.targets.is_empty() {
        return Err(DefinitionError::NoTargetSets {
            sub_effect: sub.name.clone(),
        });
    }
    if !(0.0..=1.0).contains(&sub.accuracy) {
        return Err(DefinitionError::InvalidAccuracy {
            sub_effect: sub.name.clone(),
            value: sub.accuracy,
        });
    }
    if !sub.damage.is_finite() {
        return Err(DefinitionError::InvalidDamage {
            sub_effect: sub.name.clone(),
            value: sub.damage,
        });
    }

    let damage_determinant = resolve_reference(
        sub,
        index,
        ReferenceKind::DamageDeterminant,
        sub.damage_determinant.as_ref(),
        indices,
    )?;
    let success_determinant = resolve_reference(
        sub,
        index,
        ReferenceKind::SuccessDeterminant,
        sub.success_determinant.as_ref(),
        indices,
    )?;
    let predicate = resolve_reference(
        sub,
        index,
        ReferenceKind::Predicate,
        sub.predicate.as_ref(),
        indices,
    )?;

    let count = sub.packages.len();
    let mut packages = Vec::with_capacity(count);
    for (position, package) in sub.packages.iter().enumerate() {
        if !(0.0..=1.0).contains(&package.success_rate) {
            return Err(DefinitionError::InvalidSuccessRate {
                sub_effect: sub.name.clone(),
                package: position,
                value: package.success_rate,
            });
        }
        if let Some(tie) = package.tie_success_to {
            if tie >= count {
                return Err(DefinitionError::TieOutOfRange {
                    sub_effect: sub.name.clone(),
                    package: position,
                    tie,
                    count,
                });
            }
            if tie >= position {
                return Err(DefinitionError::TieNotEarlier {
                    sub_effect: sub.name.clone(),
                    package: position,
                    tie,
                });
            }
        }
        if !package.kind.accepts(package.magnitude) {
            return Err(DefinitionError::MagnitudeMismatch {
                sub_effect: sub.name.clone(),
                package: position,
                kind: package.kind.name(),
                expected: "integral",
            });
        }

        let mut definition = package.clone();
        definition.events = package.events.as_ref().map(compile_block).transpose()?;
        packages.push(CompiledPackage { definition });
    }

    Ok(CompiledSubEffect {
        name: sub.name.clone(),
        targets: sub.targets,
        damage: sub.damage,
        accuracy: sub.accuracy,
        damage_types: sub.damage_types.clone(),
        attack_stat: sub.attack_stat,
        defense_stat: sub.defense_stat,
        hit_stat: sub.hit_stat,
        evade_stat: sub.evade_stat,
        damage_determinant,
        success_determinant,
        predicate,
        packages,
        events: sub.events.as_ref().map(compile_block).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::definition::{EffectKind, Magnitude};
    use crate::stats::StatusKind;

    fn strike(name: &str) -> SubEffectDefinition {
        SubEffectDefinition::new(name, TargetSets::PRIMARY).with_damage(10.0)
    }

    fn action(subs: Vec<SubEffectDefinition>) -> ActionDefinition {
        subs.into_iter().fold(
            ActionDefinition::new("combo", TargetShape::Single, TargetSides::ENEMIES),
            ActionDefinition::with_sub_effect,
        )
    }

    fn poison() -> EffectPackageDefinition {
        EffectPackageDefinition::new(
            EffectKind::Status {
                status: StatusKind::Poisoned,
                duration: 3,
            },
            Magnitude::Integral(4),
        )
    }

    #[test]
    fn resolves_references_to_indices() {
        let compiled = action(vec![
            strike("first"),
            strike("second")
                .with_damage_determinant("first")
                .with_predicate("first"),
        ])
        .compile()
        .unwrap();

        assert_eq!(compiled.sub_effects[1].damage_determinant, Some(0));
        assert_eq!(compiled.sub_effects[1].predicate, Some(0));
        assert_eq!(compiled.sub_effect_index("second"), Some(1));
    }

    #[test]
    fn rejects_forward_reference() {
        let err = action(vec![
            strike("first").with_success_determinant("second"),
            strike("second"),
        ])
        .compile()
        .unwrap_err();

        assert_eq!(
            err,
            DefinitionError::ForwardReference {
                sub_effect: "first".into(),
                kind: ReferenceKind::SuccessDeterminant,
                target: "second".into(),
            }
        );
    }

    #[test]
    fn rejects_self_and_unknown_references() {
        let self_ref = action(vec![strike("loop").with_predicate("loop")]).compile();
        assert!(matches!(self_ref, Err(DefinitionError::SelfReference { .. })));

        let unknown = action(vec![strike("a").with_damage_determinant("ghost")]).compile();
        assert!(matches!(
            unknown,
            Err(DefinitionError::UnknownReference { target, .. }) if target == "ghost"
        ));
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        let dup = action(vec![strike("a"), strike("a")]).compile();
        assert!(matches!(dup, Err(DefinitionError::DuplicateSubEffect { .. })));

        let empty = action(vec![strike(" ")]).compile();
        assert!(matches!(
            empty,
            Err(DefinitionError::EmptySubEffectName { index: 0, .. })
        ));

        let nameless = ActionDefinition::new("", TargetShape::Single, TargetSides::ENEMIES);
        assert_eq!(nameless.compile().unwrap_err(), DefinitionError::EmptyActionName);
    }

    #[test]
    fn package_ties_must_point_backwards() {
        let out_of_range = action(vec![strike("a").with_package(poison().tied_to(3))]).compile();
        assert!(matches!(
            out_of_range,
            Err(DefinitionError::TieOutOfRange { tie: 3, count: 1, .. })
        ));

        let not_earlier = action(vec![
            strike("a")
                .with_package(poison().tied_to(1))
                .with_package(poison()),
        ])
        .compile();
        assert!(matches!(
            not_earlier,
            Err(DefinitionError::TieNotEarlier { package: 0, tie: 1, .. })
        ));

        let ok = action(vec![
            strike("a")
                .with_package(poison())
                .with_package(poison().tied_to(0)),
        ])
        .compile();
        assert!(ok.is_ok());
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let accuracy = action(vec![strike("a").with_accuracy(1.5)]).compile();
        assert!(matches!(accuracy, Err(DefinitionError::InvalidAccuracy { .. })));

        let rate = action(vec![strike("a").with_package(poison().with_success_rate(-0.1))])
            .compile();
        assert!(matches!(rate, Err(DefinitionError::InvalidSuccessRate { .. })));

        let nan = action(vec![strike("a").with_damage(f32::NAN)]).compile();
        assert!(matches!(nan, Err(DefinitionError::InvalidDamage { .. })));
    }

    #[test]
    fn rejects_float_magnitude_for_integral_kinds() {
        let package = EffectPackageDefinition::new(EffectKind::StaminaShift, Magnitude::Float(0.5));
        let err = action(vec![strike("a").with_package(package)])
            .compile()
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::MagnitudeMismatch { kind: "stamina_shift", .. }
        ));
    }

    #[test]
    fn requires_a_target_set() {
        let err = action(vec![SubEffectDefinition::new("a", TargetSets::empty())])
            .compile()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::NoTargetSets { .. }));
    }

    #[test]
    fn sorts_event_layers() {
        let compiled = action(vec![strike("a")])
            .with_on_start(EventBlock::new("start").with_layer(1, vec![]).with_layer(9, vec![]))
            .compile()
            .unwrap();
        assert_eq!(compiled.on_start.layers[0].priority, 9);
    }
}
