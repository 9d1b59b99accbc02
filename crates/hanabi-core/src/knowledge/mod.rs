//! Epistemic model of every hand at the table.
//!
//! This module is composed of:
//! - `candidates`: the per-slot belief table ([`Candidates`]).
//! - `mental`: one player's view of all hands ([`MentalState`]).
//! - `hint`: the pure fan-out of a public hint into table updates.
//!
//! [`Knowledge`] ties them together. It is built from the first table
//! snapshot, re-synced from later ones, narrowed by hints, and pushes the
//! agent's own certainties out to every other player's view of its hand.

mod candidates;
mod hint;
mod mental;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::card::Card;
use crate::protocol::GameSnapshot;

pub use candidates::Candidates;
pub use hint::{BeliefUpdate, Hint, hint_updates};
pub use mental::MentalState;

/// Data-integrity failures of the knowledge engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KnowledgeError {
    /// An update would leave a slot with no possible card.
    #[error("{viewer}'s view of {owner} slot {slot} has no candidates left")]
    EmptyCandidates {
        viewer: String,
        owner: String,
        slot: usize,
    },

    #[error("unknown player {0:?}")]
    UnknownPlayer(String),

    #[error("slot {slot} is out of range for {owner} (hand of {len})")]
    SlotOutOfRange {
        owner: String,
        slot: usize,
        len: usize,
    },

    #[error("agent {0:?} is not in the roster")]
    AgentNotInRoster(String),
}

/// Every player's mental state, from the agent's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Knowledge {
    agent: String,
    roster: Vec<String>,
    /// One mental state per roster entry, in roster order.
    minds: Vec<MentalState>,
    agent_index: usize,
    /// Last ground truth seen for each visible hand.
    seen: BTreeMap<String, Vec<Card>>,
}

impl Knowledge {
    /// Build the model from the first snapshot of the game.
    pub fn new(
        agent: &str,
        roster: &[String],
        snapshot: &GameSnapshot,
    ) -> Result<Self, KnowledgeError> {
        let agent_index = roster
            .iter()
            .position(|p| p == agent)
            .ok_or_else(|| KnowledgeError::AgentNotInRoster(agent.to_string()))?;
        let minds = roster.iter().map(|p| MentalState::new(p, roster)).collect();
        let mut knowledge = Self {
            agent: agent.to_string(),
            roster: roster.to_vec(),
            minds,
            agent_index,
            seen: BTreeMap::new(),
        };
        knowledge.sync(snapshot)?;
        Ok(knowledge)
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn mental_state(&self, player: &str) -> Option<&MentalState> {
        let index = self.roster.iter().position(|p| p == player)?;
        self.minds.get(index)
    }

    /// The agent's own mental state.
    pub fn own(&self) -> &MentalState {
        &self.minds[self.agent_index]
    }

    /// The agent's beliefs about its own hidden hand.
    pub fn own_hand(&self) -> &[Candidates] {
        self.own().hand(&self.agent).unwrap_or_default()
    }

    fn index_of(&self, player: &str) -> Result<usize, KnowledgeError> {
        self.roster
            .iter()
            .position(|p| p == player)
            .ok_or_else(|| KnowledgeError::UnknownPlayer(player.to_string()))
    }

    /// Re-sync every visible hand from ground truth.
    ///
    /// The agent's own hand is never written from ground truth; it only
    /// follows the snapshot's hand size and drops cards whose every copy is
    /// already visible elsewhere.
    pub fn sync(&mut self, snapshot: &GameSnapshot) -> Result<(), KnowledgeError> {
        for hand in &snapshot.players {
            if hand.name == self.agent {
                continue;
            }
            let owner = self.index_of(&hand.name)?;
            let previous = self.seen.get(&hand.name);
            for (viewer, mind) in self.minds.iter_mut().enumerate() {
                if viewer != owner {
                    mind.observe(&hand.name, &hand.cards);
                    continue;
                }
                mind.resize_hand(&hand.name, hand.cards.len());
                for (slot, card) in hand.cards.iter().enumerate() {
                    let replaced = previous
                        .and_then(|cards| cards.get(slot))
                        .is_some_and(|old| old != card);
                    if replaced {
                        mind.reset_slot(&hand.name, slot);
                    }
                }
            }
            self.seen.insert(hand.name.clone(), hand.cards.clone());
        }

        for mind in &mut self.minds {
            mind.resize_hand(&self.agent, snapshot.hand_size);
        }
        self.eliminate_exhausted(snapshot)
    }

    /// Remove from the agent's own slots every card whose copies are all
    /// visible in other hands, on the fireworks, or in the discard pile.
    fn eliminate_exhausted(&mut self, snapshot: &GameSnapshot) -> Result<(), KnowledgeError> {
        let mut visible: BTreeMap<Card, u8> = BTreeMap::new();
        let shown = snapshot
            .players
            .iter()
            .filter(|h| h.name != self.agent)
            .flat_map(|h| h.cards.iter())
            .chain(&snapshot.played)
            .chain(&snapshot.discarded);
        for card in shown {
            *visible.entry(*card).or_default() += 1;
        }
        let exhausted: Candidates = visible
            .into_iter()
            .filter(|(card, count)| *count >= card.rank.copies())
            .map(|(card, _)| card)
            .collect();
        if exhausted.is_empty() {
            return Ok(());
        }

        let agent = self.agent.clone();
        let mind = &mut self.minds[self.agent_index];
        let narrowed = mind
            .hand(&agent)
            .unwrap_or_default()
            .iter()
            .map(|table| table.intersect(exhausted.complement()))
            .collect::<Vec<_>>();
        if let Some(slot) = narrowed.iter().position(|table| table.is_empty()) {
            return Err(KnowledgeError::EmptyCandidates {
                viewer: agent.clone(),
                owner: agent,
                slot,
            });
        }
        for (slot, table) in narrowed.into_iter().enumerate() {
            if mind.set_slot(&agent, slot, table) {
                tracing::debug!(slot, card = ?table.single(), "slot determined by card counting");
            }
        }
        Ok(())
    }

    /// Narrow every hint-built view of the destination's hand.
    ///
    /// Nothing is committed unless every update leaves its slot non-empty.
    /// Returns the `(viewer, slot)` pairs that collapsed to a single card.
    pub fn apply_hint(&mut self, hint: &Hint<'_>) -> Result<Vec<(String, usize)>, KnowledgeError> {
        let owner = self.index_of(hint.destination)?;
        let hand_len = self.minds[owner]
            .hand(hint.destination)
            .map_or(0, <[_]>::len);
        let updates = hint_updates(&self.agent, &self.roster, hint, hand_len)?;

        let mut staged = Vec::with_capacity(updates.len());
        for update in updates {
            let viewer = self.index_of(&update.viewer)?;
            let current = self.minds[viewer]
                .slot(&update.owner, update.slot)
                .ok_or_else(|| KnowledgeError::SlotOutOfRange {
                    owner: update.owner.clone(),
                    slot: update.slot,
                    len: hand_len,
                })?;
            let next = current.intersect(update.keep);
            if next.is_empty() {
                return Err(KnowledgeError::EmptyCandidates {
                    viewer: update.viewer,
                    owner: update.owner,
                    slot: update.slot,
                });
            }
            staged.push((viewer, update, next));
        }

        let mut collapsed = Vec::new();
        for (viewer, update, next) in staged {
            if self.minds[viewer].set_slot(&update.owner, update.slot, next) {
                collapsed.push((update.viewer, update.slot));
            }
        }
        Ok(collapsed)
    }

    /// Push the agent's newly determined slots into every other player's
    /// view of the agent's hand, then clear all pending collapses.
    ///
    /// Returns the slots that were propagated. Running it again without new
    /// collapses changes nothing.
    pub fn propagate(&mut self) -> Vec<(usize, Card)> {
        let recent = self.minds[self.agent_index].take_recent();
        for (index, mind) in self.minds.iter_mut().enumerate() {
            if index != self.agent_index {
                mind.take_recent();
            }
        }

        let mut pushed = Vec::new();
        for slot in recent {
            let Some(card) = self.own().slot(&self.agent, slot).and_then(Candidates::single)
            else {
                continue;
            };
            for (index, mind) in self.minds.iter_mut().enumerate() {
                if index != self.agent_index {
                    mind.set_slot(&self.agent, slot, Candidates::only(card));
                }
            }
            pushed.push((slot, card));
        }
        pushed
    }

    /// Forget the hint-built beliefs about a slot whose card was played or
    /// discarded and replaced.
    pub fn reset_slot(&mut self, owner: &str, slot: usize) -> Result<(), KnowledgeError> {
        let owner_index = self.index_of(owner)?;
        let len = self.minds[owner_index].hand(owner).map_or(0, <[_]>::len);
        if slot >= len {
            return Err(KnowledgeError::SlotOutOfRange {
                owner: owner.to_string(),
                slot,
                len,
            });
        }
        for (index, mind) in self.minds.iter_mut().enumerate() {
            if index == owner_index || owner_index == self.agent_index {
                mind.reset_slot(owner, slot);
            }
        }
        Ok(())
    }

    /// Forget every hint-built belief about `owner`'s hand.
    ///
    /// Used when a card left the hand but the server did not say which slot.
    pub fn reset_hand(&mut self, owner: &str) -> Result<(), KnowledgeError> {
        let owner_index = self.index_of(owner)?;
        let len = self.minds[owner_index].hand(owner).map_or(0, <[_]>::len);
        for (index, mind) in self.minds.iter_mut().enumerate() {
            if index == owner_index || owner_index == self.agent_index {
                for slot in 0..len {
                    mind.reset_slot(owner, slot);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Knowledge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mind in &self.minds {
            writeln!(f, "[{}]", mind.owner())?;
            for (player, hand) in mind.hands() {
                write!(f, "  {player}:")?;
                for table in hand {
                    match table.single() {
                        Some(card) => write!(f, " {card}")?,
                        None => write!(f, " ?{}", table.len())?,
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
