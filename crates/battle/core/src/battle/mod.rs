//! Battle state machine.
//!
//! [`Battle`] owns every piece of battle state and gates which operations are
//! legal in which phase:
//!
//! ```text
//! Offline ──start──▶ BetweenTurns ──advance──▶ AwaitingInput
//!                         ▲                        │ submit_action / pass_turn
//!                         │                        ▼
//!                         └──── turn ends ◀── ExecutingAction
//!                                   │
//!                                   ▼
//!                               Won / Lost
//! ```
//!
//! Presentation work is owned by the caller: every operation that may dispatch
//! event blocks takes the [`Presenter`] to dispatch them to, and completion
//! signals come back through [`Battle::notify_complete`].

mod phase;

pub use phase::{BattleOutcome, BattlePhase, TurnProgress, TurnSummary};

use std::sync::Arc;

use tracing::{debug, info};

use crate::action::{ActionEngine, ActionReport, CompiledAction, EngineContext, EngineProgress};
use crate::combatant::{CombatantId, CombatantSpec, Roster};
use crate::config::BattleConfig;
use crate::error::{BattleError, PreconditionError};
use crate::rng::BattleRng;
use crate::scheduler::TurnScheduler;
use crate::stats::TickReport;
use crate::sync::{EventTicket, Presenter, Synchronizer};

/// One battle: roster, scheduler, resolution engine and event synchronizer.
#[derive(Debug)]
pub struct Battle {
    roster: Roster,
    scheduler: TurnScheduler,
    engine: ActionEngine,
    sync: Synchronizer,
    rng: BattleRng,
    config: BattleConfig,
    phase: BattlePhase,
    paused: bool,
    /// Nominal delay of the action in flight, charged when its turn ends.
    pending_delay: f32,
    last_report: Option<ActionReport>,
}

impl Battle {
    /// Creates a battle from roster entries. Stances are validated here.
    pub fn new(
        specs: impl IntoIterator<Item = CombatantSpec>,
        config: BattleConfig,
    ) -> Result<Self, BattleError> {
        Self::from_roster(Roster::new(specs), config)
    }

    pub fn from_roster(roster: Roster, config: BattleConfig) -> Result<Self, BattleError> {
        for stance in roster.iter().filter_map(|c| c.stance()) {
            stance.validate()?;
        }

        let mut rng = BattleRng::new(config.seed);
        let scheduler = TurnScheduler::new(&roster, &mut rng);
        Ok(Self {
            roster,
            scheduler,
            engine: ActionEngine::new(),
            sync: Synchronizer::new(),
            rng,
            config,
            phase: BattlePhase::Offline,
            paused: false,
            pending_delay: 0.0,
            last_report: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.phase.outcome()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    pub fn engine(&self) -> &ActionEngine {
        &self.engine
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// The combatant holding the turn.
    pub fn current_actor(&self) -> Option<CombatantId> {
        self.scheduler.current()
    }

    /// Report of the most recently concluded action.
    pub fn last_report(&self) -> Option<&ActionReport> {
        self.last_report.as_ref()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Seeds initial delays and opens the battle.
    pub fn start(&mut self) -> Result<(), BattleError> {
        if self.phase != BattlePhase::Offline {
            return Err(invalid("start", self.phase));
        }
        self.scheduler.seed_delays(&mut self.roster, &self.config);
        self.phase = self
            .roster
            .outcome()
            .map_or(BattlePhase::BetweenTurns, BattlePhase::from);
        info!(
            target: "battle::state",
            combatants = self.roster.len(),
            seed = self.config.seed,
            phase = %self.phase,
            "battle started"
        );
        Ok(())
    }

    /// Advances delays if nobody is queued and hands the turn to the next
    /// actor.
    pub fn advance(&mut self) -> Result<CombatantId, BattleError> {
        self.require_phase("advance", BattlePhase::BetweenTurns)?;
        if self.paused {
            return Err(PreconditionError::Paused.into());
        }

        if !self.scheduler.ready_to_act() {
            self.scheduler
                .advance_delays(&mut self.roster, &self.config);
        }
        let actor = self.scheduler.start_turn(&self.roster, &mut self.rng)?;
        self.phase = BattlePhase::AwaitingInput;
        Ok(actor)
    }

    /// Resolves the current actor's chosen action.
    ///
    /// A rejected invocation leaves the turn open so the actor can choose
    /// again.
    pub fn submit_action(
        &mut self,
        action: Arc<CompiledAction>,
        primary: Vec<CombatantId>,
        alternate: Vec<CombatantId>,
        presenter: &mut dyn Presenter,
    ) -> Result<TurnProgress, BattleError> {
        self.require_phase("submit_action", BattlePhase::AwaitingInput)?;
        if self.paused {
            return Err(PreconditionError::Paused.into());
        }
        let actor = self
            .scheduler
            .current()
            .ok_or(PreconditionError::NoCurrentActor)?;

        let delay = action.costs.delay;
        let mut ctx = EngineContext {
            roster: &mut self.roster,
            sync: &mut self.sync,
            presenter,
            rng: &mut self.rng,
            config: &self.config,
        };
        let progress = self
            .engine
            .begin(action, actor, primary, alternate, &mut ctx)?;

        self.pending_delay = delay;
        self.phase = BattlePhase::ExecutingAction;
        self.settle(actor, progress)
    }

    /// Feeds a presentation completion signal back into the battle.
    ///
    /// Signals for tickets that no longer matter (aborted blocks, detached
    /// events, already finished actions) are ignored.
    pub fn notify_complete(
        &mut self,
        ticket: EventTicket,
        presenter: &mut dyn Presenter,
    ) -> Result<TurnProgress, BattleError> {
        if self.phase == BattlePhase::Offline {
            return Err(PreconditionError::Offline.into());
        }
        let Some(token) = self.sync.complete(ticket, presenter) else {
            return Ok(TurnProgress::Waiting);
        };
        let Some(actor) = self.scheduler.current() else {
            return Ok(TurnProgress::Waiting);
        };
        if !self.engine.is_busy() {
            return Ok(TurnProgress::Waiting);
        }

        let mut ctx = EngineContext {
            roster: &mut self.roster,
            sync: &mut self.sync,
            presenter,
            rng: &mut self.rng,
            config: &self.config,
        };
        let progress = self.engine.block_finished(token, &mut ctx)?;
        self.settle(actor, progress)
    }

    /// Ends the action in flight early. Effects already applied stay applied.
    pub fn interrupt(&mut self, presenter: &mut dyn Presenter) -> Result<TurnProgress, BattleError> {
        self.require_phase("interrupt", BattlePhase::ExecutingAction)?;
        let actor = self
            .scheduler
            .current()
            .ok_or(PreconditionError::NoCurrentActor)?;

        let mut ctx = EngineContext {
            roster: &mut self.roster,
            sync: &mut self.sync,
            presenter,
            rng: &mut self.rng,
            config: &self.config,
        };
        let progress = self.engine.end_prematurely(&mut ctx)?;
        self.settle(actor, progress)
    }

    /// Grants the current actor an immediate follow-up turn once this one ends.
    pub fn extend_current_turn(&mut self) -> Result<(), BattleError> {
        if !matches!(
            self.phase,
            BattlePhase::AwaitingInput | BattlePhase::ExecutingAction
        ) {
            return Err(invalid("extend_current_turn", self.phase));
        }
        self.scheduler.extend_current_turn()?;
        Ok(())
    }

    /// Ends the current turn without acting, charging the pass delay.
    pub fn pass_turn(&mut self) -> Result<TurnSummary, BattleError> {
        self.require_phase("pass_turn", BattlePhase::AwaitingInput)?;
        if self.paused {
            return Err(PreconditionError::Paused.into());
        }
        let actor = self
            .scheduler
            .current()
            .ok_or(PreconditionError::NoCurrentActor)?;
        debug!(target: "battle::state", %actor, "turn passed");
        self.finish_turn(actor, None, self.config.pass_delay)
    }

    /// Stops the battle from advancing. Presentation signals for an action in
    /// flight are still accepted.
    pub fn pause(&mut self) -> Result<(), BattleError> {
        self.require_started()?;
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), BattleError> {
        self.require_started()?;
        self.paused = false;
        Ok(())
    }

    /// Use the abbreviated skip block for actions concluding from now on.
    pub fn set_fast_forward(&mut self, fast_forward: bool) {
        self.config.fast_forward = fast_forward;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn settle(
        &mut self,
        actor: CombatantId,
        progress: EngineProgress,
    ) -> Result<TurnProgress, BattleError> {
        match progress {
            EngineProgress::Waiting => Ok(TurnProgress::Waiting),
            EngineProgress::Concluded(report) => {
                let delay = std::mem::take(&mut self.pending_delay);
                self.finish_turn(actor, Some(report), delay)
                    .map(TurnProgress::TurnEnded)
            }
        }
    }

    /// Charges the turn's delay, ticks the actor's modifiers, ends the turn
    /// and evaluates win/loss.
    fn finish_turn(
        &mut self,
        actor: CombatantId,
        report: Option<ActionReport>,
        base_delay: f32,
    ) -> Result<TurnSummary, BattleError> {
        let mut delay = 0.0;
        let mut tick = TickReport::default();
        if self.roster.is_alive(actor) {
            delay = self
                .scheduler
                .apply_delay(&mut self.roster, actor, base_delay, &self.config);
            if let Some(combatant) = self.roster.get_mut(actor) {
                let (report, applied) = combatant.tick_modifiers();
                tick = report;
                if applied.died {
                    debug!(target: "battle::state", %actor, "actor died to its own modifiers");
                }
            }
        }

        self.scheduler.end_turn(&self.roster)?;

        let outcome = self.roster.outcome();
        self.phase = outcome.map_or(BattlePhase::BetweenTurns, BattlePhase::from);
        if let Some(outcome) = outcome {
            info!(target: "battle::state", %outcome, "battle decided");
        }
        if report.is_some() {
            self.last_report.clone_from(&report);
        }

        debug!(target: "battle::state", %actor, delay, phase = %self.phase, "turn finished");
        Ok(TurnSummary {
            actor,
            report,
            delay,
            tick,
            outcome,
        })
    }

    fn require_started(&self) -> Result<(), PreconditionError> {
        match self.phase {
            BattlePhase::Offline => Err(PreconditionError::Offline),
            phase => match phase.outcome() {
                Some(outcome) => Err(PreconditionError::Decided(outcome)),
                None => Ok(()),
            },
        }
    }

    fn require_phase(
        &self,
        operation: &'static str,
        expected: BattlePhase,
    ) -> Result<(), PreconditionError> {
        self.require_started()?;
        if self.phase == expected {
            Ok(())
        } else {
            Err(PreconditionError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }
}

fn invalid(operation: &'static str, phase: BattlePhase) -> BattleError {
    PreconditionError::InvalidPhase { operation, phase }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{
        ActionCosts, ActionDefinition, SubEffectDefinition, TargetSets, TargetShape, TargetSides,
        Termination,
    };
    use crate::combat::TargetOutcome;
    use crate::combatant::Side;
    use crate::error::DefinitionError;
    use crate::stats::{ActiveModifier, Bonus, ModifierKind, Stance, StatKind, StatusKind};
    use crate::sync::{
        EventBlock, EventSubject, NullPresenter, PresentationEvent, PresentationKind,
        PresentationRequest,
    };

    const HERO: CombatantId = CombatantId(0);
    const SLIME: CombatantId = CombatantId(1);

    #[derive(Default)]
    struct Recorder {
        awaited: Vec<EventTicket>,
        cancelled: Vec<EventTicket>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, request: PresentationRequest) {
            if request.must_wait {
                self.awaited.push(request.ticket);
            }
        }

        fn cancel(&mut self, ticket: EventTicket) {
            self.cancelled.push(ticket);
        }
    }

    fn specs() -> Vec<CombatantSpec> {
        vec![
            CombatantSpec::new("hero", Side::Player).with_stat(StatKind::Speed, 20.0),
            CombatantSpec::new("slime", Side::Enemy).with_stat(StatKind::Speed, 5.0),
        ]
    }

    fn started(specs: Vec<CombatantSpec>) -> Battle {
        let mut battle = Battle::new(specs, BattleConfig::default()).unwrap();
        battle.start().unwrap();
        battle
    }

    fn double_strike() -> Arc<CompiledAction> {
        let definition = ActionDefinition::new("double strike", TargetShape::Single, TargetSides::ENEMIES)
            .with_sub_effect(SubEffectDefinition::new("first", TargetSets::PRIMARY).with_damage(10.0))
            .with_sub_effect(
                SubEffectDefinition::new("second", TargetSets::PRIMARY)
                    .with_damage(10.0)
                    .with_damage_determinant("first"),
            );
        Arc::new(definition.compile().unwrap())
    }

    fn with_opening(action: ActionDefinition) -> Arc<CompiledAction> {
        let block = EventBlock::new("wind up").with_layer(
            0,
            vec![PresentationEvent::awaited(
                PresentationKind::Animation,
                "wind_up",
                EventSubject::User,
            )],
        );
        Arc::new(action.with_on_start(block).compile().unwrap())
    }

    fn health(battle: &Battle, id: CombatantId) -> i32 {
        battle.roster().get(id).map_or(0, |c| c.health().current)
    }

    fn ended(progress: TurnProgress) -> TurnSummary {
        match progress {
            TurnProgress::TurnEnded(summary) => summary,
            TurnProgress::Waiting => panic!("turn did not end"),
        }
    }

    #[test]
    fn full_turn_resolves_tied_damage() {
        let mut battle = started(specs());
        assert_eq!(battle.phase(), BattlePhase::BetweenTurns);

        assert_eq!(battle.advance().unwrap(), HERO);
        assert_eq!(battle.phase(), BattlePhase::AwaitingInput);

        let summary = ended(
            battle
                .submit_action(double_strike(), vec![SLIME], vec![], &mut NullPresenter)
                .unwrap(),
        );
        assert_eq!(summary.actor, HERO);
        assert_eq!(health(&battle, SLIME), 80);

        let report = summary.report.unwrap();
        for name in ["first", "second"] {
            let target = report.sub_effect(name).unwrap().target(SLIME).unwrap();
            assert_eq!(target.result.outcome, TargetOutcome::HitOrHealed);
        }
        assert_eq!(battle.phase(), BattlePhase::BetweenTurns);
        assert_eq!(battle.current_actor(), None);
        assert_eq!(battle.last_report(), Some(&report));
    }

    #[test]
    fn killing_the_last_enemy_wins() {
        let mut specs = specs();
        specs[1] = specs[1].clone().with_health(15);
        let mut battle = started(specs);
        battle.advance().unwrap();

        let summary = ended(
            battle
                .submit_action(double_strike(), vec![SLIME], vec![], &mut NullPresenter)
                .unwrap(),
        );
        assert_eq!(summary.outcome, Some(BattleOutcome::Won));
        assert_eq!(battle.phase(), BattlePhase::Won);
        assert_eq!(
            battle.advance(),
            Err(PreconditionError::Decided(BattleOutcome::Won).into())
        );
    }

    #[test]
    fn operations_are_gated_by_phase() {
        let mut battle = Battle::new(specs(), BattleConfig::default()).unwrap();
        assert_eq!(battle.advance(), Err(PreconditionError::Offline.into()));
        assert_eq!(battle.pause(), Err(PreconditionError::Offline.into()));

        battle.start().unwrap();
        assert_eq!(
            battle.start(),
            Err(PreconditionError::InvalidPhase {
                operation: "start",
                phase: BattlePhase::BetweenTurns,
            }
            .into())
        );
        assert_eq!(
            battle.submit_action(double_strike(), vec![SLIME], vec![], &mut NullPresenter),
            Err(PreconditionError::InvalidPhase {
                operation: "submit_action",
                phase: BattlePhase::BetweenTurns,
            }
            .into())
        );
        assert!(battle.pass_turn().is_err());
        assert!(battle.extend_current_turn().is_err());

        battle.advance().unwrap();
        assert_eq!(
            battle.advance(),
            Err(PreconditionError::InvalidPhase {
                operation: "advance",
                phase: BattlePhase::AwaitingInput,
            }
            .into())
        );
    }

    #[test]
    fn paused_battle_does_not_advance() {
        let mut battle = started(specs());
        battle.pause().unwrap();
        assert!(battle.is_paused());
        assert_eq!(battle.advance(), Err(PreconditionError::Paused.into()));

        battle.resume().unwrap();
        assert_eq!(battle.advance().unwrap(), HERO);
    }

    #[test]
    fn rejected_action_keeps_the_turn_open() {
        let mut battle = started(specs());
        battle.advance().unwrap();

        let result = battle.submit_action(double_strike(), vec![HERO], vec![], &mut NullPresenter);
        assert!(matches!(
            result,
            Err(BattleError::Precondition(PreconditionError::IneligibleTarget { .. }))
        ));
        assert_eq!(battle.phase(), BattlePhase::AwaitingInput);
        assert_eq!(battle.current_actor(), Some(HERO));
    }

    #[test]
    fn passing_charges_the_scaled_pass_delay() {
        let mut battle = started(specs());
        battle.advance().unwrap();
        assert_eq!(battle.roster().get(HERO).unwrap().delay(), 0.0);

        let summary = battle.pass_turn().unwrap();
        assert_eq!(summary.report, None);
        // Speed 20 against a normalized speed of 12.5.
        assert_eq!(summary.delay, 31.25);
        assert_eq!(battle.roster().get(HERO).unwrap().delay(), 31.25);
        assert_eq!(battle.advance().unwrap(), HERO);
    }

    #[test]
    fn extended_turn_acts_again_despite_its_delay() {
        let heavy = ActionDefinition::new("heavy", TargetShape::Single, TargetSides::ENEMIES)
            .with_costs(ActionCosts {
                delay: 1000.0,
                ..ActionCosts::default()
            })
            .with_sub_effect(SubEffectDefinition::new("hit", TargetSets::PRIMARY).with_damage(1.0));
        let heavy = Arc::new(heavy.compile().unwrap());

        let mut battle = started(specs());
        battle.advance().unwrap();
        battle.extend_current_turn().unwrap();
        battle
            .submit_action(heavy.clone(), vec![SLIME], vec![], &mut NullPresenter)
            .unwrap();
        assert_eq!(battle.advance().unwrap(), HERO);

        battle
            .submit_action(heavy, vec![SLIME], vec![], &mut NullPresenter)
            .unwrap();
        assert_eq!(battle.advance().unwrap(), SLIME);
    }

    #[test]
    fn awaited_events_hold_the_turn_open() {
        let action = with_opening(
            ActionDefinition::new("lunge", TargetShape::Single, TargetSides::ENEMIES)
                .with_sub_effect(SubEffectDefinition::new("hit", TargetSets::PRIMARY).with_damage(5.0)),
        );
        let mut presenter = Recorder::default();
        let mut battle = started(specs());
        battle.advance().unwrap();

        let progress = battle
            .submit_action(action, vec![SLIME], vec![], &mut presenter)
            .unwrap();
        assert_eq!(progress, TurnProgress::Waiting);
        assert_eq!(battle.phase(), BattlePhase::ExecutingAction);
        assert_eq!(health(&battle, SLIME), 100);

        // Pausing does not stall presentation of the action in flight.
        battle.pause().unwrap();
        let ticket = presenter.awaited[0];
        let summary = ended(battle.notify_complete(ticket, &mut presenter).unwrap());
        assert_eq!(summary.report.map(|r| r.termination), Some(Termination::Completed));
        assert_eq!(health(&battle, SLIME), 95);

        // The same signal again is stale.
        assert_eq!(
            battle.notify_complete(ticket, &mut presenter).unwrap(),
            TurnProgress::Waiting
        );
    }

    #[test]
    fn interrupt_ends_the_turn_and_cancels_presentation() {
        let action = with_opening(
            ActionDefinition::new("lunge", TargetShape::Single, TargetSides::ENEMIES)
                .with_sub_effect(SubEffectDefinition::new("hit", TargetSets::PRIMARY).with_damage(5.0)),
        );
        let mut presenter = Recorder::default();
        let mut battle = started(specs());
        battle.advance().unwrap();
        battle
            .submit_action(action, vec![SLIME], vec![], &mut presenter)
            .unwrap();

        let summary = ended(battle.interrupt(&mut presenter).unwrap());
        let report = summary.report.unwrap();
        assert_eq!(report.termination, Termination::Interrupted);
        assert_eq!(presenter.cancelled, presenter.awaited);
        assert_eq!(health(&battle, SLIME), 100);
        assert_eq!(battle.phase(), BattlePhase::BetweenTurns);
    }

    #[test]
    fn modifiers_tick_when_the_holder_ends_its_turn() {
        let mut roster = Roster::new(specs());
        let hero = roster.get_mut(HERO).unwrap();
        hero.apply_damage(30);
        hero.apply_modifier(ActiveModifier {
            source: HERO,
            kind: ModifierKind::Status {
                status: StatusKind::Regenerating,
                potency: 5,
            },
            remaining: 1,
        });

        let mut battle = Battle::from_roster(roster, BattleConfig::default()).unwrap();
        battle.start().unwrap();
        battle.advance().unwrap();
        let summary = battle.pass_turn().unwrap();

        assert_eq!(summary.tick.health_delta, -5);
        assert_eq!(summary.tick.expired, 1);
        assert_eq!(health(&battle, HERO), 75);
    }

    #[test]
    fn invalid_stance_is_a_definition_error() {
        let mut specs = specs();
        specs[0] = specs[0]
            .clone()
            .with_stance(Stance::new("broken").with_bonus(StatKind::Attack, Bonus::more(f32::NAN)));

        let result = Battle::new(specs, BattleConfig::default());
        assert!(matches!(
            result,
            Err(BattleError::Definition(DefinitionError::InvalidStanceBonus { .. }))
        ));
    }

    #[test]
    fn starting_without_enemies_is_already_won() {
        let mut battle = started(vec![CombatantSpec::new("hero", Side::Player)]);
        assert_eq!(battle.outcome(), Some(BattleOutcome::Won));
        assert_eq!(
            battle.pass_turn(),
            Err(PreconditionError::Decided(BattleOutcome::Won).into())
        );
    }
}
