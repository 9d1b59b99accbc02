//! The decision worker: a dedicated thread that sleeps on the
//! [`TurnSignal`](crate::turn::TurnSignal) and sends one action per turn.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use hanabi_core::protocol::ClientMessage;

use crate::chooser::MoveChooser;
use crate::net_client::Outbound;
use crate::session::SessionState;

pub struct DecisionWorker<C> {
    name: String,
    session: Arc<SessionState>,
    chooser: C,
    outbound: Outbound,
    /// Consecutive chooser failures that still trigger a fresh snapshot.
    retries: u32,
}

impl<C: MoveChooser> DecisionWorker<C> {
    pub fn new(
        name: &str,
        session: Arc<SessionState>,
        chooser: C,
        outbound: Outbound,
        retries: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            session,
            chooser,
            outbound,
            retries,
        }
    }

    /// Start the worker on its own thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("decide-{}", self.name))
            .spawn(move || self.run())
    }

    /// Serve turns until the session stops.
    pub fn run(mut self) {
        let signal = self.session.signal();
        let mut failures = 0u32;

        while let Some(turn) = signal.wait() {
            match self.chooser.choose(&turn) {
                Ok(action) => {
                    failures = 0;
                    tracing::info!(player = %self.name, %action, "sending move");
                    let msg = action.into_message(&self.name);
                    if let Err(e) = signal.submit(|| self.outbound.send(msg)) {
                        tracing::warn!(error = %e, "could not queue move");
                        signal.confirm();
                    }
                }
                Err(e) => {
                    failures += 1;
                    signal.finish();
                    if failures > self.retries {
                        tracing::error!(error = %e, failures, "move chooser failed, skipping turn");
                        continue;
                    }
                    tracing::warn!(error = %e, failures, "move chooser failed, asking for a fresh snapshot");
                    let request = ClientMessage::GetGameState {
                        sender: self.name.clone(),
                    };
                    if let Err(e) = self.outbound.send(request) {
                        tracing::warn!(error = %e, "could not queue snapshot request");
                    }
                }
            }
        }
        tracing::debug!(player = %self.name, "decision worker stopped");
    }
}
