//! Protocol dispatcher.
//!
//! Consumes [`ServerMessage`]s one at a time, in arrival order, and turns
//! them into:
//!
//! - outbound requests (start, ready, snapshot requests),
//! - [`Knowledge`] updates (it is the only writer),
//! - [`TurnSignal`](crate::turn::TurnSignal) raises when a snapshot shows it
//!   is our turn,
//! - status changes and the decision to keep the loop going.

use std::sync::Arc;

use hanabi_core::card::Clue;
use hanabi_core::knowledge::{Hint, Knowledge};
use hanabi_core::protocol::{ClientMessage, GameSnapshot, ServerMessage};

use crate::error::AgentError;
use crate::net_client::Outbound;
use crate::session::{SessionState, Status};
use crate::turn::TurnContext;

/// How a session ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    GameOver {
        message: String,
        score: u32,
        score_message: String,
    },
    /// The session was stopped from outside (e.g. Ctrl-C).
    Interrupted,
}

/// What the dispatch loop should do after one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop(Outcome),
}

pub struct Dispatcher {
    name: String,
    session: Arc<SessionState>,
    outbound: Outbound,
    roster: Vec<String>,
    knowledge: Option<Knowledge>,
}

impl Dispatcher {
    pub fn new(name: &str, session: Arc<SessionState>, outbound: Outbound) -> Self {
        Self {
            name: name.to_string(),
            session,
            outbound,
            roster: Vec::new(),
            knowledge: None,
        }
    }

    /// Players in turn order, once the game has started.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn knowledge(&self) -> Option<&Knowledge> {
        self.knowledge.as_ref()
    }

    /// Process one server message.
    ///
    /// Errors are fatal: the knowledge is discarded and the session status
    /// becomes [`Status::Aborted`] before the error is returned.
    pub fn handle(&mut self, msg: ServerMessage) -> Result<Flow, AgentError> {
        tracing::trace!(kind = msg.kind(), "inbound");
        let result = self.dispatch(msg);
        if result.is_err() {
            self.knowledge = None;
            self.session.advance(Status::Aborted);
        }
        result
    }

    fn dispatch(&mut self, msg: ServerMessage) -> Result<Flow, AgentError> {
        match msg {
            ServerMessage::ConnectionAccepted { name } => {
                tracing::info!(player = %name, "connection accepted");
                self.send(ClientMessage::StartRequest {
                    sender: self.name.clone(),
                });
            }
            ServerMessage::StartAccepted {
                accepted,
                connected,
            } => {
                tracing::info!(accepted, connected, "players ready");
            }
            ServerMessage::GameStarted { players } => {
                tracing::info!(players = ?players, "game started");
                self.roster = players;
                self.send(ClientMessage::Ready {
                    sender: self.name.clone(),
                });
                self.session.advance(Status::Game);
                self.request_snapshot();
            }
            ServerMessage::StateSnapshot(snapshot) => self.on_snapshot(snapshot)?,
            ServerMessage::ActionRejected { message } => {
                tracing::error!(reason = %message, "action rejected");
                return Err(AgentError::Rejected { reason: message });
            }
            ServerMessage::ActionAccepted {
                last_player,
                current_player,
                slot,
                ..
            } => self.on_action("discard", &last_player, &current_player, slot)?,
            ServerMessage::MoveOk {
                last_player,
                current_player,
                slot,
                ..
            } => self.on_action("play", &last_player, &current_player, slot)?,
            ServerMessage::Mistake {
                last_player,
                current_player,
                slot,
                ..
            } => self.on_action("mistake", &last_player, &current_player, slot)?,
            ServerMessage::HintGiven {
                source,
                destination,
                clue,
                positions,
            } => self.on_hint(&source, &destination, clue, &positions)?,
            ServerMessage::DataRejected { data } => {
                tracing::warn!(data = %data, "server rejected our data");
            }
            ServerMessage::GameOver {
                message,
                score,
                score_message,
            } => {
                tracing::info!(score, message = %message, "game over");
                self.knowledge = None;
                self.session.advance(Status::Finished);
                return Ok(Flow::Stop(Outcome::GameOver {
                    message,
                    score,
                    score_message,
                }));
            }
            ServerMessage::Unknown => {
                tracing::warn!("unknown or unimplemented message");
            }
        }
        Ok(Flow::Continue)
    }

    fn send(&self, msg: ClientMessage) {
        if let Err(e) = self.outbound.send(msg) {
            tracing::warn!(error = %e, "could not queue message");
        }
    }

    fn request_snapshot(&self) {
        self.send(ClientMessage::GetGameState {
            sender: self.name.clone(),
        });
    }

    fn on_snapshot(&mut self, snapshot: GameSnapshot) -> Result<(), AgentError> {
        if self.roster.is_empty() {
            tracing::warn!("snapshot before game start, ignoring");
            return Ok(());
        }
        match self.knowledge.as_mut() {
            Some(knowledge) => knowledge.sync(&snapshot)?,
            None => self.knowledge = Some(Knowledge::new(&self.name, &self.roster, &snapshot)?),
        }
        let Some(knowledge) = self.knowledge.as_mut() else {
            return Ok(());
        };
        for (slot, card) in knowledge.propagate() {
            tracing::info!(slot, %card, "own card determined");
        }
        tracing::debug!("knowledge:\n{knowledge}");

        if self.session.status() == Status::GameHint {
            self.session.advance(Status::Game);
        }

        if snapshot.current_player == self.name {
            let context = TurnContext {
                knowledge: knowledge.clone(),
                snapshot,
            };
            if self.session.signal().raise(context) {
                tracing::info!(player = %self.name, "our turn");
            }
        }
        Ok(())
    }

    fn on_action(
        &mut self,
        kind: &str,
        last_player: &str,
        current_player: &str,
        slot: Option<usize>,
    ) -> Result<(), AgentError> {
        tracing::info!(kind, last = %last_player, current = %current_player, "action");
        if let Some(knowledge) = self.knowledge.as_mut() {
            match slot {
                Some(slot) => knowledge.reset_slot(last_player, slot)?,
                None => {
                    tracing::debug!(player = %last_player, "no slot in action, resetting hand");
                    knowledge.reset_hand(last_player)?;
                }
            }
        }
        if last_player == self.name {
            self.session.signal().confirm();
        } else {
            self.request_snapshot();
        }
        Ok(())
    }

    fn on_hint(
        &mut self,
        source: &str,
        destination: &str,
        clue: Clue,
        positions: &[usize],
    ) -> Result<(), AgentError> {
        tracing::info!(from = %source, to = %destination, %clue, ?positions, "hint");
        if source == self.name {
            self.session.signal().confirm();
        }
        let Some(knowledge) = self.knowledge.as_mut() else {
            tracing::warn!("hint before first snapshot");
            self.request_snapshot();
            return Ok(());
        };

        knowledge.apply_hint(&Hint {
            destination,
            clue,
            positions,
        })?;
        if destination == self.name {
            self.session.advance(Status::GameHint);
        }
        for (slot, card) in knowledge.propagate() {
            tracing::info!(slot, %card, "own card determined");
        }
        tracing::debug!("knowledge:\n{knowledge}");

        if source != self.name {
            self.request_snapshot();
        }
        Ok(())
    }
}
