//! Asynchronous abstraction for sourcing player and NPC intent.
//!
//! Runtime users plug in [`ActionProvider`] implementations so the battle can
//! run with human input, scripted fixtures, or AI policies.
use std::sync::Arc;

use async_trait::async_trait;
use battle_core::{CombatantId, CompiledAction, Roster, Side};
use tokio::sync::{mpsc, oneshot};

use super::errors::{ProviderKind, Result, RuntimeError};

/// An action together with the targets it was aimed at.
#[derive(Clone, Debug)]
pub struct ActionChoice {
    pub action: Arc<CompiledAction>,
    pub primary: Vec<CombatantId>,
    pub alternate: Vec<CombatantId>,
}

impl ActionChoice {
    pub fn new(action: Arc<CompiledAction>, primary: Vec<CombatantId>) -> Self {
        Self {
            action,
            primary,
            alternate: Vec::new(),
        }
    }

    pub fn with_alternate(mut self, alternate: Vec<CombatantId>) -> Self {
        self.alternate = alternate;
        self
    }
}

/// What the acting combatant does with its turn.
#[derive(Clone, Debug)]
pub enum Decision {
    Act(ActionChoice),
    Pass,
}

/// Trait for deciding what a combatant does on its turn.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - NPC AI decisions
/// - Scripted/replayed decisions
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Decide for `actor` given a read-only view of the roster.
    async fn provide_action(&self, actor: CombatantId, roster: &Roster) -> Result<Decision>;
}

/// Always passes. Useful for testing or as a fallback.
pub struct PassProvider;

#[async_trait]
impl ActionProvider for PassProvider {
    async fn provide_action(&self, _actor: CombatantId, _roster: &Roster) -> Result<Decision> {
        Ok(Decision::Pass)
    }
}

/// Uses one action against the first living combatant of the opposing side,
/// passing when nobody is left to target.
pub struct FocusFireProvider {
    action: Arc<CompiledAction>,
}

impl FocusFireProvider {
    pub fn new(action: Arc<CompiledAction>) -> Self {
        Self { action }
    }
}

#[async_trait]
impl ActionProvider for FocusFireProvider {
    async fn provide_action(&self, actor: CombatantId, roster: &Roster) -> Result<Decision> {
        let Some(side) = roster.get(actor).map(|c| c.side()) else {
            return Ok(Decision::Pass);
        };
        let opposing = match side {
            Side::Player => Side::Enemy,
            Side::Enemy | Side::Neutral => Side::Player,
        };

        let target = roster.living().find(|c| c.side() == opposing).map(|c| c.id());
        Ok(match target {
            Some(target) => Decision::Act(ActionChoice::new(Arc::clone(&self.action), vec![target])),
            None => Decision::Pass,
        })
    }
}

/// A pending decision handed to an external decision maker (a UI, a remote
/// client). Answer it through `reply`.
#[derive(Debug)]
pub struct DecisionRequest {
    pub actor: CombatantId,
    pub roster: Roster,
    pub reply: oneshot::Sender<Decision>,
}

/// Forwards every decision to a channel and waits for the answer.
pub struct ChannelProvider {
    kind: ProviderKind,
    tx: mpsc::Sender<DecisionRequest>,
}

impl ChannelProvider {
    pub fn new(kind: ProviderKind, tx: mpsc::Sender<DecisionRequest>) -> Self {
        Self { kind, tx }
    }

    /// Creates a provider and the receiving end for the decision maker.
    pub fn channel(kind: ProviderKind, capacity: usize) -> (Self, mpsc::Receiver<DecisionRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(kind, tx), rx)
    }

    fn closed(&self, reason: &str) -> RuntimeError {
        RuntimeError::Provider {
            kind: self.kind,
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ActionProvider for ChannelProvider {
    async fn provide_action(&self, actor: CombatantId, roster: &Roster) -> Result<Decision> {
        let (reply, answer) = oneshot::channel();
        let request = DecisionRequest {
            actor,
            roster: roster.clone(),
            reply,
        };
        self.tx
            .send(request)
            .await
            .map_err(|_| self.closed("request channel closed"))?;
        answer
            .await
            .map_err(|_| self.closed("decision dropped without an answer"))
    }
}
