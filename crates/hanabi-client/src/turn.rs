//! Turn hand-off between the dispatcher and the decision worker.
//!
//! The dispatcher [`raise`](TurnSignal::raise)s the signal when a snapshot
//! shows it is the agent's turn; the worker blocks in
//! [`wait`](TurnSignal::wait) until then. The signal is level-triggered: the
//! pending context lives under the same mutex as the phase and the run flag,
//! and the worker checks it before waiting and after every wake, so a raise
//! that lands before the worker starts waiting is never lost.
//!
//! A turn ends when the dispatcher sees the server report the agent's move
//! ([`confirm`](TurnSignal::confirm)); own-turn snapshots that arrive before
//! that describe the turn already played and do not raise again.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use hanabi_core::knowledge::Knowledge;
use hanabi_core::protocol::GameSnapshot;

/// Everything the move chooser may look at for one turn.
///
/// A private copy taken when the turn was detected, so the dispatcher can
/// keep updating its own Knowledge while the worker decides.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub knowledge: Knowledge,
    pub snapshot: GameSnapshot,
}

impl TurnContext {
    /// Number of cards in the agent's own hand.
    pub fn hand_size(&self) -> usize {
        self.snapshot.hand_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    /// Raised but not yet picked up by the worker.
    Pending,
    /// The worker holds the context and is choosing a move.
    Deciding,
    /// The move is queued; the turn ends when the server reports it.
    Submitted,
}

struct SignalState {
    phase: TurnPhase,
    pending: Option<TurnContext>,
    running: bool,
    fired: u64,
}

/// Level-triggered, single-slot wait/notify primitive.
pub struct TurnSignal {
    state: Mutex<SignalState>,
    wake: Condvar,
}

impl Default for TurnSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSignal {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SignalState {
                phase: TurnPhase::Idle,
                pending: None,
                running: true,
                fired: 0,
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a turn to the worker.
    ///
    /// Returns true if this raise started a new turn. While a turn is
    /// already pending the context is refreshed instead. While the worker is
    /// deciding, or its move is not yet confirmed, the raise comes from a
    /// snapshot of the same turn and is ignored. After shutdown it does
    /// nothing.
    pub fn raise(&self, context: TurnContext) -> bool {
        let mut state = self.lock();
        if !state.running {
            return false;
        }
        match state.phase {
            TurnPhase::Idle => {
                state.phase = TurnPhase::Pending;
                state.pending = Some(context);
                state.fired += 1;
                drop(state);
                self.wake.notify_one();
                true
            }
            TurnPhase::Pending => {
                state.pending = Some(context);
                false
            }
            TurnPhase::Deciding | TurnPhase::Submitted => false,
        }
    }

    /// Block until a turn is pending or the signal is shut down.
    ///
    /// Returns `None` once shut down, even if a turn was pending.
    pub fn wait(&self) -> Option<TurnContext> {
        let mut state = self.lock();
        loop {
            if !state.running {
                return None;
            }
            if let Some(context) = state.pending.take() {
                state.phase = TurnPhase::Deciding;
                return Some(context);
            }
            state = self.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Run `send` for the chosen move and mark the turn as submitted, under
    /// one lock so the server's confirmation cannot be seen first.
    pub fn submit<R>(&self, send: impl FnOnce() -> R) -> R {
        let mut state = self.lock();
        let sent = send();
        if state.phase == TurnPhase::Deciding {
            state.phase = TurnPhase::Submitted;
        }
        sent
    }

    /// The server reported the agent's move: the next own-turn snapshot
    /// starts a new turn.
    pub fn confirm(&self) {
        let mut state = self.lock();
        if state.phase == TurnPhase::Submitted {
            state.phase = TurnPhase::Idle;
        }
    }

    /// The worker gave up on the current turn without a move.
    pub fn finish(&self) {
        let mut state = self.lock();
        if state.phase == TurnPhase::Deciding {
            state.phase = TurnPhase::Idle;
        }
    }

    /// Clear the run flag and wake any waiter so it can exit.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.running = false;
        state.pending = None;
        drop(state);
        self.wake.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn phase(&self) -> TurnPhase {
        self.lock().phase
    }

    /// How many turns have been handed out so far.
    pub fn fired(&self) -> u64 {
        self.lock().fired
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hanabi_core::card::{Card, Color, Rank};
    use hanabi_core::protocol::PlayerHand;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    pub(crate) fn context(current: &str) -> TurnContext {
        let roster = vec!["a".to_string(), "b".to_string()];
        let snapshot = GameSnapshot {
            current_player: current.to_string(),
            players: vec![PlayerHand {
                name: "a".into(),
                cards: vec![Card::new(Color::Red, Rank::ONE); 4],
            }],
            hand_size: 4,
            played: Vec::new(),
            discarded: Vec::new(),
            note_tokens: 8,
            storm_tokens: 0,
        };
        let knowledge = Knowledge::new("b", &roster, &snapshot).unwrap();
        TurnContext {
            knowledge,
            snapshot,
        }
    }

    #[test]
    fn raise_before_wait_is_not_lost() {
        let signal = TurnSignal::new();
        assert!(signal.raise(context("b")));
        assert_eq!(signal.phase(), TurnPhase::Pending);

        let got = signal.wait().expect("pending turn");
        assert_eq!(got.hand_size(), 4);
        assert_eq!(signal.phase(), TurnPhase::Deciding);
        signal.finish();
        assert_eq!(signal.phase(), TurnPhase::Idle);
    }

    #[test]
    fn at_most_one_pending_turn() {
        let signal = TurnSignal::new();
        assert!(signal.raise(context("b")));
        assert!(!signal.raise(context("b")));
        assert_eq!(signal.fired(), 1);

        signal.wait().unwrap();
        // Ignored while the worker decides.
        assert!(!signal.raise(context("b")));
        signal.finish();
        assert!(signal.raise(context("b")));
        assert_eq!(signal.fired(), 2);
    }

    #[test]
    fn turn_stays_closed_until_the_move_is_confirmed() {
        let signal = TurnSignal::new();
        signal.raise(context("b"));
        signal.wait().unwrap();
        assert_eq!(signal.submit(|| 7), 7);
        assert_eq!(signal.phase(), TurnPhase::Submitted);

        // A snapshot of the turn just played.
        assert!(!signal.raise(context("b")));
        signal.confirm();
        assert_eq!(signal.phase(), TurnPhase::Idle);
        assert!(signal.raise(context("b")));
        assert_eq!(signal.fired(), 2);

        // Confirmations outside a submitted turn change nothing.
        signal.confirm();
        assert_eq!(signal.phase(), TurnPhase::Pending);
    }

    #[test]
    fn waiter_wakes_on_raise_from_another_thread() {
        let signal = Arc::new(TurnSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait().map(|c| c.snapshot.current_player))
        };
        thread::sleep(Duration::from_millis(20));
        signal.raise(context("b"));
        assert_eq!(waiter.join().unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn shutdown_wakes_waiter_and_discards_pending() {
        let signal = Arc::new(TurnSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait().is_none())
        };
        thread::sleep(Duration::from_millis(20));
        signal.shutdown();
        assert!(waiter.join().unwrap());

        assert!(!signal.raise(context("b")));
        assert!(signal.wait().is_none());
        assert!(!signal.is_running());
    }
}
