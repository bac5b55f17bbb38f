//! Event synchronization between the resolution engine and presentation.
//!
//! An [`EventBlock`] is dispatched through the [`Synchronizer`], which hands
//! its layers to a [`Presenter`] one at a time in descending priority and
//! reports the block complete once every awaited event has signalled.
//! Nothing here blocks: callers feed completion signals back in and act on
//! the returned [`BlockToken`].

mod block;
mod synchronizer;

pub use block::{
    Cinematic, EventBlock, EventLayer, EventSubject, PresentationEvent, PresentationKind,
};
pub use synchronizer::{
    BlockToken, Cast, Dispatch, EventTicket, NullPresenter, PresentationRequest, Presenter,
    Subjects, Synchronizer,
};
