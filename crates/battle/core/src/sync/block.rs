//! Event blocks - layered batches of presentation requests.

use std::collections::HashSet;

use crate::error::DefinitionError;

/// What kind of presentation work an event asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PresentationKind {
    Animation,
    Sound,
    VisualEffect,
    Caption,
    /// Long-running cinematic control attached to a whole block.
    Cinematic,
}

/// Who an event is staged on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventSubject {
    /// The combatant using the action.
    User,
    /// The targets of the sub-effect (or action) dispatching the block.
    Targets,
    /// The battlefield as a whole.
    Stage,
}

/// One presentation request inside a layer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresentationEvent {
    pub kind: PresentationKind,
    /// Presentation-layer identifier (animation name, sound id, ...).
    pub cue: String,
    pub subject: EventSubject,
    /// The layer does not finish until this event signals completion.
    #[cfg_attr(feature = "serde", serde(default))]
    pub must_wait: bool,
}

impl PresentationEvent {
    /// An event the layer waits for.
    pub fn awaited(kind: PresentationKind, cue: impl Into<String>, subject: EventSubject) -> Self {
        Self {
            kind,
            cue: cue.into(),
            subject,
            must_wait: true,
        }
    }

    /// A fire-and-forget event.
    pub fn detached(kind: PresentationKind, cue: impl Into<String>, subject: EventSubject) -> Self {
        Self {
            kind,
            cue: cue.into(),
            subject,
            must_wait: false,
        }
    }
}

/// Events dispatched concurrently; layers run in descending priority.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventLayer {
    pub priority: i32,
    pub events: Vec<PresentationEvent>,
}

/// Cinematic control running alongside a block's layers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cinematic {
    pub cue: String,
}

/// A layered, priority-ordered batch of presentation requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventBlock {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub layers: Vec<EventLayer>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cinematic: Option<Cinematic>,
}

impl EventBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
            cinematic: None,
        }
    }

    /// Builder: add a layer.
    pub fn with_layer(mut self, priority: i32, events: Vec<PresentationEvent>) -> Self {
        self.layers.push(EventLayer { priority, events });
        self
    }

    /// Builder: attach a cinematic.
    pub fn with_cinematic(mut self, cue: impl Into<String>) -> Self {
        self.cinematic = Some(Cinematic { cue: cue.into() });
        self
    }

    /// Sorts layers into dispatch order (descending priority).
    pub fn sort_layers(&mut self) {
        self.layers.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Layers are keyed by priority, so priorities must be unique.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.priority) {
                return Err(DefinitionError::DuplicateLayerPriority {
                    block: self.name.clone(),
                    priority: layer.priority,
                });
            }
        }
        Ok(())
    }

    /// Whether dispatching this block would request any presentation work.
    pub fn is_empty(&self) -> bool {
        self.cinematic.is_none() && self.layers.iter().all(|l| l.events.is_empty())
    }
}
