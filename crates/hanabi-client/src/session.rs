//! Shared session state.
//!
//! One [`SessionState`] is shared (behind an `Arc`) by the dispatch loop and
//! the decision worker. It owns the run flag (inside the [`TurnSignal`]
//! mutex, so stopping also wakes the worker), the client status, and the
//! wake-up used to break the dispatch loop out of its receive.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

use crate::turn::TurnSignal;

/// Where the client is in the game's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Connected, waiting for the game to start.
    Lobby,
    /// Playing.
    Game,
    /// A hint to us arrived; waiting for the snapshot that follows it.
    GameHint,
    /// The game ended normally.
    Finished,
    /// The session stopped on a fatal error or was interrupted.
    Aborted,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finished | Status::Aborted)
    }

    fn can_become(self, next: Status) -> bool {
        use Status::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Finished | Aborted) => true,
            (Lobby, Game) => true,
            (Game, GameHint) | (GameHint, Game) => true,
            (from, to) => from == to,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Lobby => "Lobby",
            Status::Game => "Game",
            Status::GameHint => "GameHint",
            Status::Finished => "Finished",
            Status::Aborted => "Aborted",
        };
        f.write_str(label)
    }
}

pub struct SessionState {
    status: Mutex<Status>,
    signal: TurnSignal,
    stopped: Notify,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(Status::Lobby),
            signal: TurnSignal::new(),
            stopped: Notify::new(),
        }
    }

    pub fn status(&self) -> Status {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` if the lifecycle allows it. Terminal states are final.
    ///
    /// Returns whether the status changed.
    pub fn advance(&self, next: Status) -> bool {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        let current = *status;
        if current == next || !current.can_become(next) {
            return false;
        }
        tracing::debug!(from = %current, to = %next, "status");
        *status = next;
        true
    }

    pub fn signal(&self) -> &TurnSignal {
        &self.signal
    }

    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }

    /// Clear the run flag: wakes the decision worker and the dispatch loop.
    pub fn stop(&self) {
        self.signal.shutdown();
        self.stopped.notify_one();
    }

    /// Resolves once [`stop`](Self::stop) has been called.
    pub async fn stopped(&self) {
        while self.is_running() {
            self.stopped.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lifecycle_transitions() {
        let session = SessionState::new();
        assert_eq!(session.status(), Status::Lobby);
        assert!(!session.advance(Status::GameHint));
        assert!(session.advance(Status::Game));
        assert!(session.advance(Status::GameHint));
        assert!(session.advance(Status::Game));
        assert!(!session.advance(Status::Game));
        assert!(session.advance(Status::Finished));
        assert!(!session.advance(Status::Game));
        assert!(!session.advance(Status::Aborted));
        assert_eq!(session.status(), Status::Finished);
    }

    #[tokio::test]
    async fn stop_releases_waiters() {
        let session = Arc::new(SessionState::new());
        let waiter = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.stopped().await })
        };
        tokio::task::yield_now().await;
        session.stop();
        waiter.await.unwrap();
        assert!(!session.is_running());

        // Already stopped: returns at once.
        session.stopped().await;
    }
}
