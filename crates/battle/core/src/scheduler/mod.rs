//! Turn scheduler - delay model, ready queue and tie-break.
//!
//! Every combatant carries a delay. Between turns the scheduler subtracts the
//! smallest living delay from everyone, so at least one combatant reaches
//! zero and requests a turn. Delay costs are scaled by the combatant's speed
//! factor against the battle's normalized speed, which is recomputed after
//! every turn.
//!
//! ```text
//! advance_delays → request_turn(zero-delay combatants)
//!       ↓
//! start_turn     → current actor (ties broken by the shuffled stack)
//!       ↓
//! end_turn       → normalized speed recomputed, dead retired
//! ```

mod tiebreak;

pub use tiebreak::TieBreakStack;

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::combatant::{CombatantId, Roster};
use crate::config::BattleConfig;
use crate::error::PreconditionError;
use crate::rng::RollSource;
use crate::stats::{StatKind, delay_cost, speed_factor};

/// Orders combatant turns.
#[derive(Clone, Debug)]
pub struct TurnScheduler {
    ready: VecDeque<CombatantId>,
    current: Option<CombatantId>,
    /// Holder of an extended turn, queued at the front.
    extended: Option<CombatantId>,
    normalized_speed: f32,
    ties: TieBreakStack,
}

impl TurnScheduler {
    /// Creates a scheduler over the living combatants with a freshly shuffled
    /// tie-break stack.
    pub fn new<R: RollSource>(roster: &Roster, rng: &mut R) -> Self {
        let ties = TieBreakStack::new(roster.living_ids(), rng);
        Self::with_tie_break(roster, ties)
    }

    pub fn with_tie_break(roster: &Roster, ties: TieBreakStack) -> Self {
        Self {
            ready: VecDeque::new(),
            current: None,
            extended: None,
            normalized_speed: roster.normalized_speed(),
            ties,
        }
    }

    /// Gives every living combatant the configured initial delay, scaled by
    /// its speed factor.
    pub fn seed_delays(&self, roster: &mut Roster, config: &BattleConfig) {
        for combatant in roster.iter_mut().filter(|c| c.is_alive()) {
            let factor = speed_factor(
                combatant.stat(StatKind::Speed),
                self.normalized_speed,
                config.min_speed_factor,
            );
            combatant.set_delay(delay_cost(config.initial_delay, factor));
        }
    }

    pub fn current(&self) -> Option<CombatantId> {
        self.current
    }

    pub fn normalized_speed(&self) -> f32 {
        self.normalized_speed
    }

    pub fn tie_break(&self) -> &TieBreakStack {
        &self.ties
    }

    /// Combatants waiting for a turn, in queue order.
    pub fn queued(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.ready.iter().copied()
    }

    /// Enqueues a combatant as ready to act.
    pub fn request_turn(&mut self, id: CombatantId) {
        if !self.ready.contains(&id) {
            trace!(target: "battle::scheduler", combatant = %id, "turn requested");
            self.ready.push_back(id);
        }
    }

    /// A combatant is queued and no turn is in progress.
    pub fn ready_to_act(&self) -> bool {
        !self.ready.is_empty() && self.current.is_none()
    }

    /// Pops the next actor. An extended turn wins outright; otherwise every
    /// queued combatant is tied and the shuffled stack decides.
    pub fn start_turn<R: RollSource>(
        &mut self,
        roster: &Roster,
        rng: &mut R,
    ) -> Result<CombatantId, PreconditionError> {
        if self.current.is_some() {
            return Err(PreconditionError::TurnInProgress);
        }
        self.ready.retain(|&id| roster.is_alive(id));

        let extended = self
            .extended
            .take()
            .filter(|&id| self.ready.front() == Some(&id));
        let winner = if let Some(id) = extended {
            Some(id)
        } else {
            let tied: Vec<_> = self.ready.iter().copied().collect();
            self.ties.pick(&tied, rng)
        }
        .ok_or(PreconditionError::NoReadyCombatant)?;

        self.ready.retain(|&id| id != winner);
        self.current = Some(winner);
        debug!(target: "battle::scheduler", actor = %winner, "turn started");
        Ok(winner)
    }

    /// Clears the current actor, recomputes normalized speed and drops dead
    /// combatants from the queue and the tie-break stack.
    pub fn end_turn(&mut self, roster: &Roster) -> Result<CombatantId, PreconditionError> {
        let actor = self.current.take().ok_or(PreconditionError::NoCurrentActor)?;

        self.normalized_speed = roster.normalized_speed();
        for dead in roster.iter().filter(|c| !c.is_alive()).map(|c| c.id()) {
            self.retire(dead);
        }

        debug!(
            target: "battle::scheduler",
            %actor,
            normalized_speed = self.normalized_speed,
            "turn ended"
        );
        Ok(actor)
    }

    /// Grants the current actor an immediate follow-up turn.
    pub fn extend_current_turn(&mut self) -> Result<(), PreconditionError> {
        let actor = self.current.ok_or(PreconditionError::NoCurrentActor)?;
        self.ready.retain(|&id| id != actor);
        self.ready.push_front(actor);
        self.extended = Some(actor);
        debug!(target: "battle::scheduler", %actor, "turn extended");
        Ok(())
    }

    /// Removes a combatant from scheduling.
    pub fn retire(&mut self, id: CombatantId) {
        self.ready.retain(|&r| r != id);
        if self.extended == Some(id) {
            self.extended = None;
        }
        self.ties.retire(id);
    }

    /// Subtracts the smallest living delay from every living combatant and
    /// requests turns for everyone now at zero, in roster order.
    ///
    /// Does nothing while combatants are still queued. Returns how many
    /// combatants became ready.
    pub fn advance_delays(&mut self, roster: &mut Roster, config: &BattleConfig) -> usize {
        if !self.ready.is_empty() {
            return 0;
        }
        let Some(step) = roster.living().map(|c| c.delay()).reduce(f32::min) else {
            return 0;
        };

        let mut newly_ready = Vec::new();
        for combatant in roster.iter_mut().filter(|c| c.is_alive()) {
            let remaining = combatant.delay() - step;
            if remaining <= config.delay_epsilon {
                combatant.set_delay(0.0);
                newly_ready.push(combatant.id());
            } else {
                combatant.set_delay(remaining);
            }
        }

        trace!(
            target: "battle::scheduler",
            step,
            ready = newly_ready.len(),
            "delays advanced"
        );
        let count = newly_ready.len();
        for id in newly_ready {
            self.request_turn(id);
        }
        count
    }

    /// Adds a nominal delay to a combatant, scaled by its speed factor.
    /// Returns the delay actually added.
    pub fn apply_delay(
        &self,
        roster: &mut Roster,
        id: CombatantId,
        base_delay: f32,
        config: &BattleConfig,
    ) -> f32 {
        let Some(combatant) = roster.get_mut(id) else {
            return 0.0;
        };
        let factor = speed_factor(
            combatant.stat(StatKind::Speed),
            self.normalized_speed,
            config.min_speed_factor,
        );
        let cost = delay_cost(base_delay, factor);
        combatant.add_delay(cost);
        cost
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::combatant::{CombatantSpec, Side};
    use crate::rng::BattleRng;

    const A: CombatantId = CombatantId(0);
    const B: CombatantId = CombatantId(1);
    const C: CombatantId = CombatantId(2);

    fn roster_with_speeds(speeds: &[f32]) -> Roster {
        Roster::new(speeds.iter().enumerate().map(|(i, &speed)| {
            let side = if i % 2 == 0 { Side::Player } else { Side::Enemy };
            CombatantSpec::new(format!("c{i}"), side).with_stat(StatKind::Speed, speed)
        }))
    }

    fn set_delays(roster: &mut Roster, delays: &[f32]) {
        for (combatant, &delay) in roster.iter_mut().zip(delays) {
            combatant.set_delay(delay);
        }
    }

    #[test]
    fn simultaneous_readiness_is_broken_by_the_stack() {
        let mut roster = roster_with_speeds(&[10.0, 10.0, 10.0]);
        set_delays(&mut roster, &[5.0, 5.0, 5.0]);
        let config = BattleConfig::default();
        let mut rng = BattleRng::new(3);
        let mut scheduler =
            TurnScheduler::with_tie_break(&roster, TieBreakStack::with_order([C, A, B]));

        assert_eq!(scheduler.advance_delays(&mut roster, &config), 3);
        assert!(scheduler.ready_to_act());

        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(C));
        assert!(!scheduler.ready_to_act());
        scheduler.end_turn(&roster).unwrap();

        // Same stack, no reshuffle: C is not picked again.
        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(A));
        scheduler.end_turn(&roster).unwrap();
        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(B));
    }

    #[test]
    fn advance_subtracts_the_minimum() {
        let mut roster = roster_with_speeds(&[10.0, 10.0, 10.0]);
        set_delays(&mut roster, &[30.0, 12.5, 40.0]);
        let mut rng = BattleRng::new(1);
        let mut scheduler = TurnScheduler::new(&roster, &mut rng);

        assert_eq!(scheduler.advance_delays(&mut roster, &BattleConfig::default()), 1);
        let delays: Vec<_> = roster.iter().map(|c| c.delay()).collect();
        assert_eq!(delays, vec![17.5, 0.0, 27.5]);
        assert_eq!(scheduler.queued().collect::<Vec<_>>(), vec![B]);
    }

    #[test]
    fn advance_waits_for_the_queue_to_drain() {
        let mut roster = roster_with_speeds(&[10.0, 10.0]);
        set_delays(&mut roster, &[0.0, 8.0]);
        let mut scheduler = TurnScheduler::with_tie_break(&roster, TieBreakStack::default());
        scheduler.request_turn(A);

        assert_eq!(scheduler.advance_delays(&mut roster, &BattleConfig::default()), 0);
        assert_eq!(roster.get(B).unwrap().delay(), 8.0);
    }

    #[test]
    fn delay_scales_with_speed_factor() {
        let mut roster = roster_with_speeds(&[20.0, 10.0, 0.0]);
        let config = BattleConfig::default();
        let scheduler = TurnScheduler::with_tie_break(&roster, TieBreakStack::default());
        assert_eq!(scheduler.normalized_speed(), 10.0);

        assert_eq!(scheduler.apply_delay(&mut roster, A, 100.0, &config), 50.0);
        assert_eq!(scheduler.apply_delay(&mut roster, B, 100.0, &config), 100.0);
        // Zero speed is floored at the minimum factor.
        assert_eq!(scheduler.apply_delay(&mut roster, C, 10.0, &config), 100.0);
    }

    #[test]
    fn initial_delays_favor_the_fast() {
        let mut roster = roster_with_speeds(&[20.0, 5.0]);
        let scheduler = TurnScheduler::with_tie_break(&roster, TieBreakStack::default());
        scheduler.seed_delays(&mut roster, &BattleConfig::default().with_initial_delay(100.0));

        assert!(roster.get(A).unwrap().delay() < roster.get(B).unwrap().delay());
    }

    #[test]
    fn end_turn_recomputes_normalized_speed() {
        let mut roster = roster_with_speeds(&[10.0, 30.0, 20.0]);
        let mut rng = BattleRng::new(1);
        let mut scheduler = TurnScheduler::new(&roster, &mut rng);
        scheduler.request_turn(A);
        scheduler.start_turn(&roster, &mut rng).unwrap();

        if let Some(c) = roster.get_mut(B) {
            c.apply_damage(1000);
        }
        scheduler.end_turn(&roster).unwrap();

        assert_eq!(scheduler.normalized_speed(), 15.0);
        assert!(scheduler.tie_break().remaining().all(|id| id != B));
    }

    #[test]
    fn extended_turn_goes_first() {
        let roster = roster_with_speeds(&[10.0, 10.0]);
        let mut rng = BattleRng::new(1);
        let mut scheduler = TurnScheduler::with_tie_break(&roster, TieBreakStack::with_order([B, A]));
        scheduler.request_turn(A);
        scheduler.request_turn(B);

        let first = scheduler.start_turn(&roster, &mut rng).unwrap();
        assert_eq!(first, B);
        scheduler.extend_current_turn().unwrap();
        scheduler.end_turn(&roster).unwrap();

        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(B));
    }

    #[test]
    fn dead_extended_actor_forfeits_its_priority() {
        let mut roster = roster_with_speeds(&[10.0, 10.0, 10.0]);
        let mut rng = BattleRng::new(1);
        let mut scheduler =
            TurnScheduler::with_tie_break(&roster, TieBreakStack::with_order([A, C, B]));
        for id in [A, B, C] {
            scheduler.request_turn(id);
        }

        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(A));
        scheduler.extend_current_turn().unwrap();
        if let Some(c) = roster.get_mut(A) {
            c.apply_damage(1000);
        }
        scheduler.end_turn(&roster).unwrap();

        // B sits at the front of the queue, but the stack still decides.
        assert_eq!(scheduler.queued().next(), Some(B));
        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(C));
    }

    #[test]
    fn extension_is_dropped_when_its_holder_leaves_the_queue() {
        let mut roster = roster_with_speeds(&[10.0, 10.0, 10.0]);
        let mut rng = BattleRng::new(1);
        let mut scheduler =
            TurnScheduler::with_tie_break(&roster, TieBreakStack::with_order([A, C, B]));
        for id in [A, B, C] {
            scheduler.request_turn(id);
        }

        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(A));
        scheduler.extend_current_turn().unwrap();
        scheduler.end_turn(&roster).unwrap();
        // Killed outside of a turn, so nothing retires it before the next pick.
        if let Some(c) = roster.get_mut(A) {
            c.apply_damage(1000);
        }

        assert_eq!(scheduler.start_turn(&roster, &mut rng), Ok(C));
    }

    #[test]
    fn contract_violations_are_reported() {
        let roster = roster_with_speeds(&[10.0]);
        let mut rng = BattleRng::new(1);
        let mut scheduler = TurnScheduler::new(&roster, &mut rng);

        assert_eq!(
            scheduler.extend_current_turn(),
            Err(PreconditionError::NoCurrentActor)
        );
        assert_eq!(scheduler.end_turn(&roster), Err(PreconditionError::NoCurrentActor));
        assert_eq!(
            scheduler.start_turn(&roster, &mut rng),
            Err(PreconditionError::NoReadyCombatant)
        );

        scheduler.request_turn(A);
        scheduler.start_turn(&roster, &mut rng).unwrap();
        scheduler.request_turn(A);
        assert_eq!(
            scheduler.start_turn(&roster, &mut rng),
            Err(PreconditionError::TurnInProgress)
        );
    }

    proptest! {
        #[test]
        fn advancing_always_readies_someone(
            delays in prop::collection::vec(0.0f32..1000.0, 1..8),
        ) {
            let speeds = vec![10.0; delays.len()];
            let mut roster = roster_with_speeds(&speeds);
            set_delays(&mut roster, &delays);
            let mut scheduler = TurnScheduler::with_tie_break(&roster, TieBreakStack::default());

            let ready = scheduler.advance_delays(&mut roster, &BattleConfig::default());

            prop_assert!(ready >= 1);
            prop_assert!(roster.living().any(|c| c.delay() == 0.0));
            prop_assert!(roster.living().all(|c| c.delay() >= 0.0));
        }

        #[test]
        fn normalized_speed_is_the_living_mean(
            speeds in prop::collection::vec(1.0f32..100.0, 2..8),
            dead in 0usize..8,
        ) {
            let mut roster = roster_with_speeds(&speeds);
            let victim = CombatantId((dead % speeds.len()) as u32);
            if let Some(c) = roster.get_mut(victim) {
                c.apply_damage(10_000);
            }
            let living: Vec<f32> = roster.living().map(|c| c.stat(StatKind::Speed)).collect();
            let expected = living.iter().sum::<f32>() / living.len() as f32;

            let mut rng = BattleRng::new(7);
            let mut scheduler = TurnScheduler::new(&roster, &mut rng);
            let actor = roster.living_ids().next().unwrap();
            scheduler.request_turn(actor);
            scheduler.start_turn(&roster, &mut rng).unwrap();
            scheduler.end_turn(&roster).unwrap();

            prop_assert!((scheduler.normalized_speed() - expected).abs() < 1e-3);
        }
    }
}
