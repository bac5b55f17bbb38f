//! Action resolution engine.
//!
//! The engine runs an action until it has to wait for presentation, then
//! returns [`EngineProgress::Waiting`]. The caller feeds finished event
//! blocks back through [`ActionEngine::block_finished`] until the engine
//! reports [`EngineProgress::Concluded`].
//!
//! ## Sub-effect steps
//!
//! 1. damage figures: copied from the damage determinant, else computed
//! 2. hit/miss: copied from the success determinant, else rolled
//! 3. damage applied to every target the sub-effect landed on
//! 4. effect packages resolved in declaration order
//! 5. sub-effect and package event blocks dispatched and awaited
//!
//! After each sub-effect, dead combatants are pruned from every target list.
//! If the user died, the remaining sub-effects are aborted.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::compile::{CompiledAction, CompiledPackage, CompiledSubEffect};
use super::definition::{EffectKind, Magnitude};
use super::handle::{ActionHandle, PackageHandle, SubEffectHandle, SubEffectState, TargetResult};
use super::report::{ActionReport, Termination};
use super::targeting::{TargetSets, TargetShape};
use crate::combat::{
    DamageInput, PackageOutcome, TargetOutcome, calculate_damage, check_roll, contested_chance,
};
use crate::combatant::{CombatantId, DamageApplied, Roster};
use crate::config::BattleConfig;
use crate::error::PreconditionError;
use crate::rng::RollSource;
use crate::stats::{ActiveModifier, Bonus, ModifierApplication, ModifierKind};
use crate::sync::{BlockToken, Cast, Dispatch, EventBlock, Presenter, Synchronizer};

/// Everything the engine reads or mutates while resolving an action.
pub struct EngineContext<'a> {
    pub roster: &'a mut Roster,
    pub sync: &'a mut Synchronizer,
    pub presenter: &'a mut dyn Presenter,
    pub rng: &'a mut dyn RollSource,
    pub config: &'a BattleConfig,
}

/// Where the engine stands after a call.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineProgress {
    /// Waiting on dispatched event blocks.
    Waiting,
    /// The action concluded; its handles have been discarded.
    Concluded(ActionReport),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Opening,
    SubEffect(usize),
    Settling(usize),
    Concluding,
    Closed,
}

#[derive(Debug)]
struct InFlight {
    handle: ActionHandle,
    stage: Stage,
    awaiting: BTreeSet<BlockToken>,
    termination: Termination,
}

/// Resolves at most one action at a time.
#[derive(Debug, Default)]
pub struct ActionEngine {
    in_flight: Option<InFlight>,
}

impl ActionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an action is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Handle of the action in flight.
    pub fn handle(&self) -> Option<&ActionHandle> {
        self.in_flight.as_ref().map(|f| &f.handle)
    }

    /// Blocks the engine is waiting on.
    pub fn awaiting(&self) -> impl Iterator<Item = BlockToken> + '_ {
        self.in_flight.iter().flat_map(|f| f.awaiting.iter().copied())
    }

    /// Validates the invocation, pays the stamina cost and runs the action
    /// up to its first suspension point.
    pub fn begin(
        &mut self,
        action: Arc<CompiledAction>,
        user: CombatantId,
        primary: Vec<CombatantId>,
        alternate: Vec<CombatantId>,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineProgress, PreconditionError> {
        if self.in_flight.is_some() {
            return Err(PreconditionError::ActionInFlight);
        }

        let primary = if action.shape == TargetShape::SelfOnly {
            vec![user]
        } else {
            primary
        };
        validate_targets(&action, user, &primary, &alternate, ctx.roster)?;

        let cost = action.costs.stamina;
        let Some(combatant) = ctx.roster.get_mut(user) else {
            return Err(PreconditionError::UnknownCombatant(user));
        };
        if !combatant.spend_stamina(cost) {
            return Err(PreconditionError::InsufficientStamina {
                required: cost,
                available: combatant.stamina().current,
            });
        }

        debug!(
            target: "battle::engine",
            action = %action.name,
            %user,
            primary = primary.len(),
            alternate = alternate.len(),
            "beginning action"
        );

        self.in_flight = Some(InFlight {
            handle: ActionHandle::new(action, user, primary, alternate),
            stage: Stage::Opening,
            awaiting: BTreeSet::new(),
            termination: Termination::Completed,
        });
        Ok(self.advance(ctx))
    }

    /// Resumes after a dispatched block finished. Tokens the engine is not
    /// waiting on are ignored.
    pub fn block_finished(
        &mut self,
        token: BlockToken,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineProgress, PreconditionError> {
        let flight = self
            .in_flight
            .as_mut()
            .ok_or(PreconditionError::NoActionInFlight)?;
        if !flight.awaiting.remove(&token) {
            trace!(target: "battle::engine", block = %token, "ignoring unrelated block");
            return Ok(EngineProgress::Waiting);
        }
        Ok(self.advance(ctx))
    }

    /// Aborts the in-flight sub-effect's presentation and every remaining
    /// sub-effect. Effects already applied stay applied.
    pub fn end_prematurely(
        &mut self,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineProgress, PreconditionError> {
        let flight = self
            .in_flight
            .as_mut()
            .ok_or(PreconditionError::NoActionInFlight)?;

        for token in std::mem::take(&mut flight.awaiting) {
            ctx.sync.abort(token, ctx.presenter);
        }

        match flight.stage {
            Stage::Opening | Stage::SubEffect(_) | Stage::Settling(_) => {
                for sub in &mut flight.handle.sub_effects {
                    if sub.state == SubEffectState::Pending {
                        sub.state = SubEffectState::Aborted;
                    }
                }
                flight.handle.prune(ctx.roster);
                flight.termination = Termination::Interrupted;
                flight.stage = Stage::Concluding;
                debug!(
                    target: "battle::engine",
                    action = %flight.handle.action.name,
                    "action ended prematurely"
                );
            }
            Stage::Concluding | Stage::Closed => {}
        }

        Ok(self.advance(ctx))
    }

    fn advance(&mut self, ctx: &mut EngineContext<'_>) -> EngineProgress {
        loop {
            let Some(flight) = self.in_flight.as_mut() else {
                return EngineProgress::Waiting;
            };
            if !flight.awaiting.is_empty() {
                return EngineProgress::Waiting;
            }

            match flight.stage {
                Stage::Opening => {
                    flight.stage = Stage::SubEffect(0);
                    let action = Arc::clone(&flight.handle.action);
                    let targets = flight.handle.primary.clone();
                    dispatch(flight, &action.on_start, targets, ctx);
                }
                Stage::SubEffect(index) if index >= flight.handle.sub_effects.len() => {
                    flight.stage = Stage::Concluding;
                }
                Stage::SubEffect(index) => {
                    flight.stage = Stage::Settling(index);
                    run_sub_effect(flight, index, ctx);
                }
                Stage::Settling(index) => {
                    let pruned = flight.handle.prune(ctx.roster);
                    if pruned > 0 {
                        trace!(target: "battle::engine", pruned, "pruned dead targets");
                    }
                    if ctx.roster.is_alive(flight.handle.user) {
                        flight.stage = Stage::SubEffect(index + 1);
                    } else {
                        for sub in &mut flight.handle.sub_effects[index + 1..] {
                            sub.state = SubEffectState::Aborted;
                        }
                        flight.termination = Termination::UserDied;
                        flight.stage = Stage::Concluding;
                        debug!(
                            target: "battle::engine",
                            user = %flight.handle.user,
                            "user died, aborting remaining sub-effects"
                        );
                    }
                }
                Stage::Concluding => {
                    flight.stage = Stage::Closed;
                    let action = Arc::clone(&flight.handle.action);
                    let skip = ctx.config.fast_forward || flight.termination == Termination::Interrupted;
                    let block = if skip {
                        &action.on_skip
                    } else {
                        &action.on_conclusion
                    };
                    let targets = flight.handle.primary.clone();
                    dispatch(flight, block, targets, ctx);
                }
                Stage::Closed => {
                    let report = ActionReport::from_handle(&flight.handle, flight.termination);
                    self.in_flight = None;
                    debug!(
                        target: "battle::engine",
                        action = %report.action,
                        termination = %report.termination,
                        "action concluded"
                    );
                    return EngineProgress::Concluded(report);
                }
            }
        }
    }
}

fn validate_targets(
    action: &CompiledAction,
    user: CombatantId,
    primary: &[CombatantId],
    alternate: &[CombatantId],
    roster: &Roster,
) -> Result<(), PreconditionError> {
    let user_combatant = roster.require_living(user)?;

    if let Some(max) = action.shape.max_primary()
        && primary.len() > max
    {
        return Err(PreconditionError::TooManyTargets {
            action: action.name.clone(),
            max,
            got: primary.len(),
        });
    }

    for &id in primary {
        let target = roster.require_living(id)?;
        if action.shape != TargetShape::SelfOnly && !action.sides.admits(user_combatant, target) {
            return Err(PreconditionError::IneligibleTarget {
                action: action.name.clone(),
                target: id,
            });
        }
    }
    for &id in alternate {
        roster.require_living(id)?;
    }
    Ok(())
}

/// Dispatches a non-empty block and records it as awaited when pending.
fn dispatch(
    flight: &mut InFlight,
    block: &EventBlock,
    targets: Vec<CombatantId>,
    ctx: &mut EngineContext<'_>,
) {
    if block.is_empty() {
        return;
    }
    let cast = Cast::new(flight.handle.user, targets);
    if let Dispatch::Pending(token) = ctx.sync.dispatch(block, cast, ctx.presenter) {
        flight.awaiting.insert(token);
    }
}

fn run_sub_effect(flight: &mut InFlight, index: usize, ctx: &mut EngineContext<'_>) {
    let action = Arc::clone(&flight.handle.action);
    let def = &action.sub_effects[index];
    let user = flight.handle.user;

    if let Some(predicate) = def.predicate
        && !flight.handle.sub_effects[predicate].landed_any()
    {
        flight.handle.sub_effects[index].state = SubEffectState::Skipped;
        debug!(target: "battle::engine", sub_effect = %def.name, "predicate unmet, skipping");
        return;
    }

    let targets = flight.handle.sub_effects[index].targets.clone();
    if targets.is_empty() {
        flight.handle.sub_effects[index].state = SubEffectState::Skipped;
        debug!(target: "battle::engine", sub_effect = %def.name, "no targets left, skipping");
        return;
    }

    let figures = match def.damage_determinant {
        Some(det) => tied_figures(
            &flight.handle.sub_effects[det],
            &action.sub_effects[det],
            def,
            &targets,
        ),
        None => targets
            .iter()
            .map(|&target| direct_figure(def, user, target, ctx.roster))
            .collect(),
    };

    let landed = match def.success_determinant {
        Some(det) => tied_success(
            &flight.handle.sub_effects[det],
            action.sub_effects[det].targets,
            user,
            def.targets,
            &targets,
        ),
        None => targets
            .iter()
            .map(|&target| roll_accuracy(def, user, target, ctx))
            .collect(),
    };

    // Every target's hit is resolved before any package.
    let mut results = Vec::with_capacity(targets.len());
    for ((&target, figure), landed) in targets.iter().zip(figures).zip(landed) {
        let outcome = TargetOutcome::classify(def.damage, def.accuracy, landed, figure);
        let applied = if outcome.landed() && figure != 0 {
            ctx.roster
                .get_mut(target)
                .map(|c| c.apply_damage(figure))
                .unwrap_or_default()
        } else {
            DamageApplied::default()
        };
        if applied.died {
            debug!(target: "battle::engine", %target, sub_effect = %def.name, "target died");
        }
        results.push(TargetResult {
            target,
            outcome,
            figure,
            dealt: applied.dealt,
            died: applied.died,
        });
    }

    let mut packages: Vec<PackageHandle> = Vec::with_capacity(def.packages.len());
    for package in &def.packages {
        let outcomes = results
            .iter()
            .map(|result| {
                let outcome = resolve_package(package, def, result, &packages, user, ctx);
                (result.target, outcome)
            })
            .collect();
        packages.push(PackageHandle { outcomes });
    }

    trace!(
        target: "battle::engine",
        sub_effect = %def.name,
        targets = results.len(),
        landed = results.iter().filter(|r| r.outcome.landed()).count(),
        "sub-effect resolved"
    );

    let package_casts: Vec<Vec<CombatantId>> =
        packages.iter().map(|p| p.succeeded().collect()).collect();

    let handle = &mut flight.handle.sub_effects[index];
    handle.results = results;
    handle.packages = packages;
    handle.state = SubEffectState::Executed;

    if let Some(block) = &def.events {
        dispatch(flight, block, targets, ctx);
    }
    for (package, cast) in def.packages.iter().zip(package_casts) {
        if let Some(block) = &package.definition.events
            && !cast.is_empty()
        {
            dispatch(flight, block, cast, ctx);
        }
    }
}

fn direct_figure(
    def: &CompiledSubEffect,
    user: CombatantId,
    target: CombatantId,
    roster: &Roster,
) -> i32 {
    let (Some(attacker), Some(defender)) = (roster.get(user), roster.get(target)) else {
        return 0;
    };
    calculate_damage(
        DamageInput {
            base: def.damage,
            attack: attacker.stat_ref(def.attack_stat),
            defense: defender.stat_ref(def.defense_stat),
            types: &def.damage_types,
        },
        defender.resistances(),
    )
}

fn roll_accuracy(
    def: &CompiledSubEffect,
    user: CombatantId,
    target: CombatantId,
    ctx: &mut EngineContext<'_>,
) -> bool {
    if def.damage == 0.0 && def.accuracy == 0.0 {
        return true;
    }
    let attacker = ctx.roster.get(user).and_then(|c| c.stat_ref(def.hit_stat));
    let defender = ctx.roster.get(target).and_then(|c| c.stat_ref(def.evade_stat));
    let chance = contested_chance(def.accuracy, attacker, defender);
    check_roll(chance, ctx.rng.roll())
}

/// Damage figures copied from a determinant.
///
/// Matching target sets copy per target; otherwise the determinant's mean
/// figure is broadcast. Figures are negated when the base damages have
/// opposite signs.
fn tied_figures(
    det: &SubEffectHandle,
    det_def: &CompiledSubEffect,
    def: &CompiledSubEffect,
    targets: &[CombatantId],
) -> Vec<i32> {
    let sign = if det_def.damage * def.damage < 0.0 { -1 } else { 1 };
    if det_def.targets == def.targets {
        targets
            .iter()
            .map(|&t| det.result(t).map_or(0, |r| r.figure) * sign)
            .collect()
    } else {
        vec![det.mean_figure() * sign; targets.len()]
    }
}

/// Hit/miss copied from a determinant.
///
/// - same target sets: per target
/// - determinant targets only the user: its result on the user, broadcast
/// - otherwise: landed if the determinant landed on any target, broadcast
///
/// A determinant that never executed counts as a miss everywhere.
fn tied_success(
    det: &SubEffectHandle,
    det_sets: TargetSets,
    user: CombatantId,
    sets: TargetSets,
    targets: &[CombatantId],
) -> Vec<bool> {
    if det.state != SubEffectState::Executed {
        return vec![false; targets.len()];
    }
    let landed_on = |id: CombatantId| det.result(id).is_some_and(|r| r.outcome.landed());

    if det_sets == sets {
        targets.iter().map(|&t| landed_on(t)).collect()
    } else if det_sets.is_self() {
        vec![landed_on(user); targets.len()]
    } else {
        let any = det.results().iter().any(|r| r.outcome.landed());
        vec![any; targets.len()]
    }
}

fn resolve_package(
    package: &CompiledPackage,
    def: &CompiledSubEffect,
    result: &TargetResult,
    earlier: &[PackageHandle],
    user: CombatantId,
    ctx: &mut EngineContext<'_>,
) -> PackageOutcome {
    let target = result.target;
    if !ctx.roster.is_alive(target) {
        return PackageOutcome::NotApplicable;
    }
    let spec = &package.definition;

    let succeeds = match package.tie() {
        Some(tie) => match earlier.get(tie).and_then(|p| p.outcome(target)) {
            None | Some(PackageOutcome::NotApplicable) => return PackageOutcome::NotApplicable,
            Some(outcome) => outcome.succeeded(),
        },
        None if !result.outcome.landed() && !spec.apply_on_miss => false,
        None => {
            let (attacker, defender) = match spec.contest {
                Some(contest) => (
                    ctx.roster.get(user).map(|c| c.stat(contest.attacker)),
                    ctx.roster.get(target).map(|c| c.stat(contest.defender)),
                ),
                None => (None, None),
            };
            let chance = contested_chance(spec.success_rate, attacker, defender);
            check_roll(chance, ctx.rng.roll())
        }
    };

    if !succeeds {
        trace!(target: "battle::engine", %target, sub_effect = %def.name, "package failed");
        return PackageOutcome::Failure;
    }
    apply_package(spec.kind, spec.magnitude, user, target, ctx)
}

fn apply_package(
    kind: EffectKind,
    magnitude: Magnitude,
    user: CombatantId,
    target: CombatantId,
    ctx: &mut EngineContext<'_>,
) -> PackageOutcome {
    let scale = ctx.config.knockback_scale;
    let Some(combatant) = ctx.roster.get_mut(target) else {
        return PackageOutcome::NotApplicable;
    };

    match (kind, magnitude) {
        (EffectKind::StatModifier { stat, duration }, magnitude) => {
            let bonus = match magnitude {
                Magnitude::Float(percent) => Bonus::more(percent),
                Magnitude::Integral(flat) => Bonus::flat(flat as f32),
            };
            modifier_outcome(combatant.apply_modifier(ActiveModifier {
                source: user,
                kind: ModifierKind::Stat { stat, bonus },
                remaining: duration,
            }))
        }
        (EffectKind::Status { status, duration }, Magnitude::Integral(potency)) => {
            modifier_outcome(combatant.apply_modifier(ActiveModifier {
                source: user,
                kind: ModifierKind::Status { status, potency },
                remaining: duration,
            }))
        }
        (EffectKind::Knockback, Magnitude::Integral(flat)) => {
            combatant.add_delay(flat as f32 * scale);
            PackageOutcome::Success
        }
        (EffectKind::Knockback, Magnitude::Float(fraction)) => {
            combatant.add_delay(combatant.delay() * fraction * scale);
            PackageOutcome::Success
        }
        (EffectKind::StaminaShift, Magnitude::Integral(amount)) => {
            combatant.shift_stamina(amount);
            PackageOutcome::Success
        }
        // Rejected at compile time.
        (EffectKind::Status { .. } | EffectKind::StaminaShift, Magnitude::Float(_)) => {
            PackageOutcome::Failure
        }
    }
}

fn modifier_outcome(application: Option<ModifierApplication>) -> PackageOutcome {
    match application {
        Some(ModifierApplication::Added) => PackageOutcome::Success,
        Some(ModifierApplication::Refreshed) => PackageOutcome::Partial,
        None => PackageOutcome::NotApplicable,
    }
}
