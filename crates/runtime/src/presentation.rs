//! Channel-backed bridge to the presentation layer.
//!
//! The battle hands presentation requests to a [`ChannelPresenter`], which
//! forwards them to whoever renders the battle. Completion signals travel
//! back on a separate channel and are fed into the battle by the runner.

use battle_core::{EventTicket, PresentationRequest, Presenter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Work handed to the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum PresentationCommand {
    Present(PresentationRequest),
    /// The block owning this ticket was aborted; stop the work if possible.
    Cancel(EventTicket),
}

/// An awaited presentation request finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentationSignal {
    pub ticket: EventTicket,
}

/// [`Presenter`] that forwards every request over an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<PresentationCommand>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<PresentationCommand>) -> Self {
        Self { tx }
    }

    /// Creates a presenter and the receiving end for the presentation layer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PresentationCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, command: PresentationCommand) {
        if self.tx.send(command).is_err() {
            warn!(target: "runtime::presentation", "presentation layer is gone, dropping request");
        }
    }
}

impl Presenter for ChannelPresenter {
    fn present(&mut self, request: PresentationRequest) {
        self.send(PresentationCommand::Present(request));
    }

    fn cancel(&mut self, ticket: EventTicket) {
        self.send(PresentationCommand::Cancel(ticket));
    }
}

/// Spawns a headless presentation layer that finishes every awaited request
/// immediately.
pub fn spawn_instant_presentation(
    mut commands: mpsc::UnboundedReceiver<PresentationCommand>,
    signals: mpsc::UnboundedSender<PresentationSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            match command {
                PresentationCommand::Present(request) if request.must_wait => {
                    debug!(
                        target: "runtime::presentation",
                        ticket = %request.ticket,
                        cue = %request.cue,
                        "instantly completing"
                    );
                    if signals
                        .send(PresentationSignal {
                            ticket: request.ticket,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                PresentationCommand::Present(_) | PresentationCommand::Cancel(_) => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{BlockToken, PresentationKind, Subjects};

    fn request(ticket: u64, must_wait: bool) -> PresentationRequest {
        PresentationRequest {
            ticket: EventTicket(ticket),
            block: BlockToken(1),
            kind: PresentationKind::Animation,
            cue: "slash".into(),
            subjects: Subjects::Stage,
            must_wait,
        }
    }

    #[tokio::test]
    async fn instant_presentation_answers_awaited_requests_only() {
        let (mut presenter, commands) = ChannelPresenter::channel();
        let (signal_tx, mut signals) = mpsc::unbounded_channel();
        let task = spawn_instant_presentation(commands, signal_tx);

        presenter.present(request(1, false));
        presenter.present(request(2, true));
        presenter.cancel(EventTicket(3));

        assert_eq!(
            signals.recv().await,
            Some(PresentationSignal {
                ticket: EventTicket(2)
            })
        );

        drop(presenter);
        task.await.unwrap();
        assert!(signals.try_recv().is_err());
    }
}
