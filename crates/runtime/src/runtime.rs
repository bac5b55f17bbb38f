//! High-level battle runner.
//!
//! The runner owns the [`Battle`], asks providers for decisions, forwards
//! presentation work over channels and feeds completion signals back in. A
//! presentation layer that stays silent past the configured timeout gets the
//! action in flight interrupted instead of stalling the battle.

use std::time::Duration;

use battle_core::{
    Battle, BattleConfig, BattleError, BattleOutcome, BattlePhase, CombatantId, Side, TurnProgress,
    TurnSummary,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ActionProvider, Decision, ProviderKind, Result, RuntimeError};
use crate::events::{ActionEvent, BattleEvent, Event, EventBus, Topic, TurnEvent};
use crate::presentation::{
    ChannelPresenter, PresentationCommand, PresentationSignal, spawn_instant_presentation,
};
use crate::scenario::Scenario;

/// Runtime configuration shared across the runner and its presentation link.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    pub event_buffer_size: usize,
    /// How long to wait for a presentation signal before interrupting.
    pub presentation_timeout: Duration,
    /// Overrides `battle.seed`; a random seed is drawn when `None`.
    pub seed: Option<u64>,
    /// Stop with an error after this many turns without a decision.
    pub max_turns: Option<u64>,
}

impl RuntimeConfig {
    /// Battle configuration with the seed resolved.
    pub fn battle_config(&self) -> BattleConfig {
        let seed = self.seed.unwrap_or_else(rand::random);
        self.battle.clone().with_seed(seed)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            event_buffer_size: 100,
            presentation_timeout: Duration::from_secs(10),
            seed: None,
            max_turns: None,
        }
    }
}

/// Drives one battle to its outcome.
///
/// Design: the runner exclusively owns the battle; observers subscribe to
/// the [`EventBus`] instead of sharing state.
pub struct BattleRunner {
    battle: Battle,
    presenter: ChannelPresenter,
    signals: mpsc::UnboundedReceiver<PresentationSignal>,
    /// Headless presentation, spawned lazily on the first step.
    headless: Option<(
        mpsc::UnboundedReceiver<PresentationCommand>,
        mpsc::UnboundedSender<PresentationSignal>,
    )>,
    responder: Option<JoinHandle<()>>,

    player_provider: Option<Box<dyn ActionProvider>>,
    npc_provider: Option<Box<dyn ActionProvider>>,

    events: EventBus,
    presentation_timeout: Duration,
    max_turns: Option<u64>,
    turns: u64,
}

impl BattleRunner {
    /// Create a new runner builder
    pub fn builder() -> BattleRunnerBuilder {
        BattleRunnerBuilder::new()
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to runner events on one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    /// Turns played so far.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Set the player action provider
    pub fn set_player_provider(&mut self, provider: impl ActionProvider + 'static) {
        self.player_provider = Some(Box::new(provider));
    }

    /// Set the NPC action provider
    pub fn set_npc_provider(&mut self, provider: impl ActionProvider + 'static) {
        self.npc_provider = Some(Box::new(provider));
    }

    /// Plays one turn: advance, decide, resolve, await presentation.
    pub async fn step(&mut self) -> Result<TurnSummary> {
        self.ensure_started()?;
        self.ensure_presentation();

        let actor = self.battle.advance()?;
        self.turns += 1;
        self.events.publish(Event::Turn(TurnEvent::Started {
            actor,
            turn: self.turns,
        }));

        let decision = {
            let kind = self.provider_kind(actor);
            let provider = match kind {
                ProviderKind::Player => self.player_provider.as_ref(),
                ProviderKind::Npc => self.npc_provider.as_ref(),
            }
            .ok_or(RuntimeError::ProviderNotSet { kind })?;
            provider.provide_action(actor, self.battle.roster()).await?
        };

        let progress = match decision {
            Decision::Act(choice) => {
                let name = choice.action.name.clone();
                match self.battle.submit_action(
                    choice.action,
                    choice.primary,
                    choice.alternate,
                    &mut self.presenter,
                ) {
                    Ok(progress) => progress,
                    Err(BattleError::Precondition(error)) => {
                        warn!(target: "runtime::battle", %actor, action = %name, %error, "action rejected, passing");
                        self.events.publish(Event::Action(ActionEvent::Rejected {
                            actor,
                            action: name,
                            error: error.to_string(),
                        }));
                        TurnProgress::TurnEnded(self.battle.pass_turn()?)
                    }
                    Err(error) => return Err(error.into()),
                }
            }
            Decision::Pass => TurnProgress::TurnEnded(self.battle.pass_turn()?),
        };

        let summary = self.drive(actor, progress).await?;
        self.publish_turn(&summary);
        Ok(summary)
    }

    /// Plays turns until the battle is decided.
    pub async fn run(&mut self) -> Result<BattleOutcome> {
        self.ensure_started()?;
        loop {
            if let Some(outcome) = self.battle.outcome() {
                return Ok(outcome);
            }
            if let Some(limit) = self.max_turns
                && self.turns >= limit
            {
                return Err(RuntimeError::TurnLimitReached(self.turns));
            }
            self.step().await?;
        }
    }

    /// Shutdown the runner, waiting for the headless presentation task.
    pub async fn shutdown(self) -> Result<()> {
        let BattleRunner {
            presenter,
            responder,
            ..
        } = self;
        drop(presenter);

        if let Some(responder) = responder {
            responder.await.map_err(RuntimeError::TaskJoin)?;
        }
        Ok(())
    }

    fn provider_kind(&self, actor: CombatantId) -> ProviderKind {
        match self.battle.roster().get(actor).map(|c| c.side()) {
            Some(Side::Player) => ProviderKind::Player,
            _ => ProviderKind::Npc,
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.battle.phase() == BattlePhase::Offline {
            self.battle.start()?;
            self.events.publish(Event::Battle(BattleEvent::Started {
                combatants: self.battle.roster().len(),
                seed: self.battle.config().seed,
            }));
            if let Some(outcome) = self.battle.outcome() {
                self.publish_decided(outcome);
            }
        }
        Ok(())
    }

    fn ensure_presentation(&mut self) {
        if let Some((commands, signals)) = self.headless.take() {
            self.responder = Some(spawn_instant_presentation(commands, signals));
        }
    }

    /// Feeds presentation signals into the battle until the turn ends.
    async fn drive(&mut self, actor: CombatantId, mut progress: TurnProgress) -> Result<TurnSummary> {
        loop {
            match progress {
                TurnProgress::TurnEnded(summary) => return Ok(summary),
                TurnProgress::Waiting => {
                    let signal =
                        tokio::time::timeout(self.presentation_timeout, self.signals.recv()).await;
                    progress = match signal {
                        Ok(Some(signal)) => self
                            .battle
                            .notify_complete(signal.ticket, &mut self.presenter)?,
                        Ok(None) => return Err(RuntimeError::PresentationChannelClosed),
                        Err(_) => {
                            warn!(
                                target: "runtime::battle",
                                %actor,
                                timeout = ?self.presentation_timeout,
                                "presentation timed out, interrupting action"
                            );
                            self.events
                                .publish(Event::Action(ActionEvent::Interrupted { actor }));
                            self.battle.interrupt(&mut self.presenter)?
                        }
                    };
                }
            }
        }
    }

    fn publish_turn(&self, summary: &TurnSummary) {
        debug!(
            target: "runtime::battle",
            actor = %summary.actor,
            turn = self.turns,
            delay = summary.delay,
            "turn completed"
        );
        if let Some(report) = &summary.report {
            self.events.publish(Event::Action(ActionEvent::Concluded {
                report: report.clone(),
            }));
        }
        self.events.publish(Event::Turn(TurnEvent::Ended {
            actor: summary.actor,
            turn: self.turns,
            delay: summary.delay,
            tick_health_delta: summary.tick.health_delta,
        }));
        if let Some(outcome) = summary.outcome {
            self.publish_decided(outcome);
        }
    }

    fn publish_decided(&self, outcome: BattleOutcome) {
        info!(target: "runtime::battle", %outcome, turns = self.turns, "battle decided");
        self.events.publish(Event::Battle(BattleEvent::Decided {
            outcome,
            turns: self.turns,
        }));
    }
}

/// Builder for [`BattleRunner`] with flexible configuration.
pub struct BattleRunnerBuilder {
    config: RuntimeConfig,
    battle: Option<Battle>,
    scenario: Option<Scenario>,
    presentation: Option<(ChannelPresenter, mpsc::UnboundedReceiver<PresentationSignal>)>,
    player_provider: Option<Box<dyn ActionProvider>>,
    npc_provider: Option<Box<dyn ActionProvider>>,
    events: Option<EventBus>,
}

impl BattleRunnerBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            battle: None,
            scenario: None,
            presentation: None,
            player_provider: None,
            npc_provider: None,
            events: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Run an already constructed battle. Its own configuration is kept.
    pub fn battle(mut self, battle: Battle) -> Self {
        self.battle = Some(battle);
        self
    }

    /// Build the battle from a scenario with the runtime's battle config.
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Connect a real presentation layer. Without one, every awaited request
    /// completes immediately.
    pub fn presentation(
        mut self,
        presenter: ChannelPresenter,
        signals: mpsc::UnboundedReceiver<PresentationSignal>,
    ) -> Self {
        self.presentation = Some((presenter, signals));
        self
    }

    /// Set player action provider (optional)
    pub fn player_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.player_provider = Some(Box::new(provider));
        self
    }

    /// Set NPC action provider (optional)
    pub fn npc_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.npc_provider = Some(Box::new(provider));
        self
    }

    /// Share an existing event bus
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<BattleRunner> {
        let battle = match (self.battle, self.scenario) {
            (Some(battle), _) => battle,
            (None, Some(scenario)) => scenario.create_battle(self.config.battle_config())?,
            (None, None) => {
                return Err(RuntimeError::InvalidScenario(
                    "runner requires a battle or a scenario".to_string(),
                ));
            }
        };

        let (presenter, signals, headless) = match self.presentation {
            Some((presenter, signals)) => (presenter, signals, None),
            None => {
                let (presenter, commands) = ChannelPresenter::channel();
                let (signal_tx, signals) = mpsc::unbounded_channel();
                (presenter, signals, Some((commands, signal_tx)))
            }
        };

        Ok(BattleRunner {
            battle,
            presenter,
            signals,
            headless,
            responder: None,
            player_provider: self.player_provider,
            npc_provider: self.npc_provider,
            events: self
                .events
                .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size)),
            presentation_timeout: self.config.presentation_timeout,
            max_turns: self.config.max_turns,
            turns: 0,
        })
    }
}
