//! Layered dispatch of event blocks with per-layer awaited sets.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use tracing::{debug, trace};

use super::block::{EventBlock, EventLayer, EventSubject, PresentationKind};
use crate::combatant::CombatantId;

/// Identifies one dispatched event block until it completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockToken(pub u64);

impl fmt::Display for BlockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block-{}", self.0)
    }
}

/// Identifies one presentation request handed to the presenter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventTicket(pub u64);

impl fmt::Display for EventTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket-{}", self.0)
    }
}

/// Combatants a block is staged on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cast {
    pub user: CombatantId,
    pub targets: Vec<CombatantId>,
}

impl Cast {
    pub fn new(user: CombatantId, targets: Vec<CombatantId>) -> Self {
        Self { user, targets }
    }

    fn resolve(&self, subject: EventSubject) -> Subjects {
        match subject {
            EventSubject::User => Subjects::User(self.user),
            EventSubject::Targets => Subjects::Targets(self.targets.clone()),
            EventSubject::Stage => Subjects::Stage,
        }
    }
}

/// Resolved subjects of one presentation request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Subjects {
    User(CombatantId),
    Targets(Vec<CombatantId>),
    Stage,
}

/// One unit of presentation work handed to the presenter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresentationRequest {
    pub ticket: EventTicket,
    pub block: BlockToken,
    pub kind: PresentationKind,
    pub cue: String,
    pub subjects: Subjects,
    /// The synchronizer waits for this ticket to be completed.
    pub must_wait: bool,
}

/// The external presentation layer.
///
/// Awaited requests must eventually be answered with
/// [`Synchronizer::complete`]; fire-and-forget requests need no answer.
pub trait Presenter {
    fn present(&mut self, request: PresentationRequest);

    /// An outstanding awaited request was abandoned by an abort.
    fn cancel(&mut self, _ticket: EventTicket) {}
}

/// Presenter that drops every request. Useful for headless simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _request: PresentationRequest) {}
}

/// Result of dispatching a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The block had nothing to wait for and is already complete.
    Finished(BlockToken),
    /// The block is waiting on presentation signals.
    Pending(BlockToken),
}

impl Dispatch {
    pub fn token(self) -> BlockToken {
        match self {
            Dispatch::Finished(token) | Dispatch::Pending(token) => token,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Dispatch::Finished(_))
    }
}

#[derive(Debug)]
struct BlockRun {
    name: String,
    cast: Cast,
    layers: Vec<EventLayer>,
    next_layer: usize,
    awaited: BTreeSet<EventTicket>,
    cinematic: Option<EventTicket>,
}

impl BlockRun {
    fn is_done(&self) -> bool {
        self.next_layer >= self.layers.len() && self.awaited.is_empty() && self.cinematic.is_none()
    }
}

/// Drives event blocks through their layers.
///
/// Every pending block completes exactly once: either through the last
/// awaited [`complete`](Self::complete) signal or through
/// [`abort`](Self::abort).
#[derive(Debug, Default)]
pub struct Synchronizer {
    next_block: u64,
    next_ticket: u64,
    runs: BTreeMap<BlockToken, BlockRun>,
    owners: HashMap<EventTicket, BlockToken>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a block: the cinematic (if any) and the first layers run until
    /// a layer has awaited events or all layers are exhausted.
    pub fn dispatch(
        &mut self,
        block: &EventBlock,
        cast: Cast,
        presenter: &mut dyn Presenter,
    ) -> Dispatch {
        let token = BlockToken(self.next_block);
        self.next_block += 1;

        let mut layers = block.layers.clone();
        layers.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut run = BlockRun {
            name: block.name.clone(),
            cast,
            layers,
            next_layer: 0,
            awaited: BTreeSet::new(),
            cinematic: None,
        };

        if let Some(cinematic) = &block.cinematic {
            let ticket = self.issue(token, true);
            run.cinematic = Some(ticket);
            presenter.present(PresentationRequest {
                ticket,
                block: token,
                kind: PresentationKind::Cinematic,
                cue: cinematic.cue.clone(),
                subjects: Subjects::Stage,
                must_wait: true,
            });
        }

        debug!(
            target: "battle::sync",
            block = %token,
            name = %run.name,
            layers = run.layers.len(),
            "dispatching event block"
        );

        self.run_layers(token, &mut run, presenter);
        if run.is_done() {
            trace!(target: "battle::sync", block = %token, "event block finished synchronously");
            Dispatch::Finished(token)
        } else {
            self.runs.insert(token, run);
            Dispatch::Pending(token)
        }
    }

    /// Records a completion signal.
    ///
    /// Returns the block token when this signal finished its block. Unknown,
    /// stale and fire-and-forget tickets are ignored.
    pub fn complete(
        &mut self,
        ticket: EventTicket,
        presenter: &mut dyn Presenter,
    ) -> Option<BlockToken> {
        let Some(token) = self.owners.remove(&ticket) else {
            trace!(target: "battle::sync", %ticket, "ignoring stale completion");
            return None;
        };
        let mut run = self.runs.remove(&token)?;

        if run.cinematic == Some(ticket) {
            run.cinematic = None;
        } else {
            run.awaited.remove(&ticket);
        }

        if run.awaited.is_empty() {
            self.run_layers(token, &mut run, presenter);
        }

        if run.is_done() {
            debug!(target: "battle::sync", block = %token, name = %run.name, "event block finished");
            Some(token)
        } else {
            self.runs.insert(token, run);
            None
        }
    }

    /// Abandons a pending block: outstanding awaited tickets are cancelled and
    /// layers that have not started count as finished without being presented.
    ///
    /// Returns true when the block was pending; the block counts as complete.
    pub fn abort(&mut self, token: BlockToken, presenter: &mut dyn Presenter) -> bool {
        let Some(run) = self.runs.remove(&token) else {
            return false;
        };

        let outstanding = run.awaited.iter().copied().chain(run.cinematic);
        for ticket in outstanding {
            self.owners.remove(&ticket);
            presenter.cancel(ticket);
        }

        debug!(
            target: "battle::sync",
            block = %token,
            name = %run.name,
            skipped_layers = run.layers.len().saturating_sub(run.next_layer),
            "event block aborted"
        );
        true
    }

    /// Aborts every pending block, returning their tokens.
    pub fn abort_all(&mut self, presenter: &mut dyn Presenter) -> Vec<BlockToken> {
        let tokens: Vec<_> = self.runs.keys().copied().collect();
        for &token in &tokens {
            self.abort(token, presenter);
        }
        tokens
    }

    pub fn is_pending(&self, token: BlockToken) -> bool {
        self.runs.contains_key(&token)
    }

    /// Number of blocks waiting on presentation signals.
    pub fn pending(&self) -> usize {
        self.runs.len()
    }

    fn issue(&mut self, token: BlockToken, awaited: bool) -> EventTicket {
        let ticket = EventTicket(self.next_ticket);
        self.next_ticket += 1;
        if awaited {
            self.owners.insert(ticket, token);
        }
        ticket
    }

    /// Presents layers until one has to be waited for.
    fn run_layers(&mut self, token: BlockToken, run: &mut BlockRun, presenter: &mut dyn Presenter) {
        while run.awaited.is_empty() && run.next_layer < run.layers.len() {
            let layer = &run.layers[run.next_layer];
            run.next_layer += 1;
            trace!(
                target: "battle::sync",
                block = %token,
                priority = layer.priority,
                events = layer.events.len(),
                "starting layer"
            );

            for event in &layer.events {
                let ticket = self.issue(token, event.must_wait);
                if event.must_wait {
                    run.awaited.insert(ticket);
                }
                presenter.present(PresentationRequest {
                    ticket,
                    block: token,
                    kind: event.kind,
                    cue: event.cue.clone(),
                    subjects: run.cast.resolve(event.subject),
                    must_wait: event.must_wait,
                });
            }
        }
    }
}
