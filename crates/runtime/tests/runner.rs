use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use battle_core::{
    ActionCosts, ActionDefinition, Battle, BattleConfig, BattleOutcome, CombatantId, CombatantSpec,
    CompiledAction, EventBlock, EventSubject, PresentationEvent, PresentationKind, Roster, Side,
    StatKind, SubEffectDefinition, TargetSets, TargetShape, TargetSides, Termination,
};
use battle_runtime::{
    ActionChoice, ActionEvent, ActionProvider, BattleEvent, BattleRunner, ChannelPresenter,
    Decision, Event, FocusFireProvider, PassProvider, ProviderKind, Result, RuntimeConfig,
    RuntimeError, Topic,
};
use tokio::sync::mpsc;

const HERO: CombatantId = CombatantId(0);
const SLIME: CombatantId = CombatantId(1);

fn strike(awaited: bool) -> Arc<CompiledAction> {
    let mut definition = ActionDefinition::new("strike", TargetShape::Single, TargetSides::ENEMIES)
        .with_costs(ActionCosts {
            delay: 100.0,
            ..ActionCosts::default()
        })
        .with_sub_effect(SubEffectDefinition::new("hit", TargetSets::PRIMARY).with_damage(10.0));
    if awaited {
        definition = definition.with_on_start(EventBlock::new("wind up").with_layer(
            0,
            vec![
                PresentationEvent::awaited(PresentationKind::Animation, "wind_up", EventSubject::User),
                PresentationEvent::detached(PresentationKind::Sound, "whoosh", EventSubject::Stage),
            ],
        ));
    }
    Arc::new(definition.compile().unwrap())
}

fn battle(slime_health: i32) -> Battle {
    Battle::new(
        [
            CombatantSpec::new("hero", Side::Player).with_stat(StatKind::Speed, 20.0),
            CombatantSpec::new("slime", Side::Enemy)
                .with_stat(StatKind::Speed, 4.0)
                .with_health(slime_health),
        ],
        BattleConfig::default().with_seed(7),
    )
    .unwrap()
}

fn health(runner: &BattleRunner, id: CombatantId) -> i32 {
    runner
        .battle()
        .roster()
        .get(id)
        .map_or(0, |c| c.health().current)
}

/// Targets the acting combatant itself, which offensive actions reject.
struct SelfTargeting(Arc<CompiledAction>);

#[async_trait]
impl ActionProvider for SelfTargeting {
    async fn provide_action(&self, actor: CombatantId, _roster: &Roster) -> Result<Decision> {
        Ok(Decision::Act(ActionChoice::new(Arc::clone(&self.0), vec![actor])))
    }
}

#[tokio::test]
async fn headless_battle_runs_to_victory() {
    let mut runner = BattleRunner::builder()
        .battle(battle(25))
        .player_provider(FocusFireProvider::new(strike(true)))
        .npc_provider(FocusFireProvider::new(strike(true)))
        .build()
        .unwrap();
    let mut lifecycle = runner.subscribe(Topic::Battle);

    let outcome = runner.run().await.unwrap();
    assert_eq!(outcome, BattleOutcome::Won);
    // The slime is too slow to act before its third hit lands.
    assert_eq!(runner.turns(), 3);
    assert_eq!(health(&runner, HERO), 100);
    assert_eq!(health(&runner, SLIME), 0);

    assert!(matches!(
        lifecycle.recv().await.unwrap(),
        Event::Battle(BattleEvent::Started { combatants: 2, seed: 7 })
    ));
    assert_eq!(
        lifecycle.recv().await.unwrap(),
        Event::Battle(BattleEvent::Decided {
            outcome: BattleOutcome::Won,
            turns: 3,
        })
    );

    runner.shutdown().await.unwrap();
}

#[tokio::test]
async fn silent_presentation_gets_the_action_interrupted() {
    let (presenter, _commands) = ChannelPresenter::channel();
    let (_signal_tx, signals) = mpsc::unbounded_channel();
    let config = RuntimeConfig {
        presentation_timeout: Duration::from_millis(20),
        ..RuntimeConfig::default()
    };
    let mut runner = BattleRunner::builder()
        .config(config)
        .battle(battle(25))
        .presentation(presenter, signals)
        .player_provider(FocusFireProvider::new(strike(true)))
        .build()
        .unwrap();
    let mut actions = runner.subscribe(Topic::Action);

    let summary = runner.step().await.unwrap();
    let report = summary.report.unwrap();
    assert_eq!(report.termination, Termination::Interrupted);
    assert_eq!(health(&runner, SLIME), 25);

    assert_eq!(
        actions.recv().await.unwrap(),
        Event::Action(ActionEvent::Interrupted { actor: HERO })
    );
    assert!(matches!(
        actions.recv().await.unwrap(),
        Event::Action(ActionEvent::Concluded { .. })
    ));
}

#[tokio::test]
async fn rejected_action_passes_the_turn() {
    let mut runner = BattleRunner::builder()
        .battle(battle(25))
        .player_provider(SelfTargeting(strike(false)))
        .build()
        .unwrap();
    let mut actions = runner.subscribe(Topic::Action);

    let summary = runner.step().await.unwrap();
    assert_eq!(summary.actor, HERO);
    assert_eq!(summary.report, None);
    assert!(summary.delay > 0.0);

    let Event::Action(ActionEvent::Rejected { actor, action, .. }) = actions.recv().await.unwrap()
    else {
        panic!("expected a rejection");
    };
    assert_eq!(actor, HERO);
    assert_eq!(action, "strike");
}

#[tokio::test]
async fn missing_provider_is_reported() {
    let mut runner = BattleRunner::builder()
        .battle(battle(25))
        .npc_provider(PassProvider)
        .build()
        .unwrap();

    let error = runner.step().await.unwrap_err();
    assert!(matches!(
        error,
        RuntimeError::ProviderNotSet {
            kind: ProviderKind::Player
        }
    ));
}

#[tokio::test]
async fn endless_battle_hits_the_turn_limit() {
    let config = RuntimeConfig {
        max_turns: Some(6),
        ..RuntimeConfig::default()
    };
    let mut runner = BattleRunner::builder()
        .config(config)
        .battle(battle(25))
        .player_provider(PassProvider)
        .npc_provider(PassProvider)
        .build()
        .unwrap();

    let error = runner.run().await.unwrap_err();
    assert!(matches!(error, RuntimeError::TurnLimitReached(6)));
    assert_eq!(runner.battle().outcome(), None);
}

#[tokio::test]
async fn closed_signal_channel_fails_the_step() {
    let (presenter, _commands) = ChannelPresenter::channel();
    let (signal_tx, signals) = mpsc::unbounded_channel();
    drop(signal_tx);
    let mut runner = BattleRunner::builder()
        .battle(battle(25))
        .presentation(presenter, signals)
        .player_provider(FocusFireProvider::new(strike(true)))
        .build()
        .unwrap();

    let error = runner.step().await.unwrap_err();
    assert!(matches!(error, RuntimeError::PresentationChannelClosed));
}

#[tokio::test]
async fn runner_requires_a_battle() {
    let error = BattleRunner::builder().build().err().unwrap();
    assert!(matches!(error, RuntimeError::InvalidScenario(_)));
}
