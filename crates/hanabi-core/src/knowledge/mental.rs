use std::collections::{BTreeMap, BTreeSet};

use crate::card::Card;

use super::candidates::Candidates;

/// What one player is credited with believing about every hand at the table.
///
/// Fully-determined slots are not stored separately: a slot is fully
/// determined exactly when its table holds one card. `recent` keeps the
/// owner's own slots that collapsed since the last propagation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentalState {
    owner: String,
    hands: BTreeMap<String, Vec<Candidates>>,
    recent: BTreeSet<usize>,
}

impl MentalState {
    pub(crate) fn new<'a>(owner: &str, roster: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            owner: owner.to_string(),
            hands: roster.into_iter().map(|p| (p.clone(), Vec::new())).collect(),
            recent: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Belief tables about `player`'s hand, slot by slot.
    pub fn hand(&self, player: &str) -> Option<&[Candidates]> {
        self.hands.get(player).map(Vec::as_slice)
    }

    pub fn slot(&self, player: &str, slot: usize) -> Option<Candidates> {
        self.hands.get(player)?.get(slot).copied()
    }

    /// Slots of `player`'s hand this state has pinned to a single card.
    pub fn fully_determined(&self, player: &str) -> Vec<(usize, Card)> {
        self.hand(player)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(slot, table)| table.single().map(|card| (slot, card)))
            .collect()
    }

    /// Own slots that collapsed and have not been propagated yet.
    pub fn recently_determined(&self) -> impl Iterator<Item = usize> + '_ {
        self.recent.iter().copied()
    }

    pub(crate) fn hands(&self) -> impl Iterator<Item = (&String, &Vec<Candidates>)> {
        self.hands.iter()
    }

    /// Overwrite one table. Returns true if the slot just became fully
    /// determined.
    pub(crate) fn set_slot(&mut self, player: &str, slot: usize, table: Candidates) -> bool {
        let Some(current) = self.hands.get_mut(player).and_then(|h| h.get_mut(slot)) else {
            return false;
        };
        let collapsed = !current.is_determined() && table.is_determined();
        *current = table;
        if collapsed && player == self.owner {
            self.recent.insert(slot);
        }
        collapsed
    }

    /// Forget everything about a slot whose card was replaced.
    pub(crate) fn reset_slot(&mut self, player: &str, slot: usize) {
        if let Some(table) = self.hands.get_mut(player).and_then(|h| h.get_mut(slot)) {
            *table = Candidates::FULL;
        }
        if player == self.owner {
            self.recent.remove(&slot);
        }
    }

    /// Grow (with full tables) or shrink `player`'s hand to `len` slots.
    pub(crate) fn resize_hand(&mut self, player: &str, len: usize) {
        let hand = self.hands.entry(player.to_string()).or_default();
        hand.resize(len, Candidates::FULL);
        if player == self.owner {
            self.recent.retain(|slot| *slot < len);
        }
    }

    /// Replace `player`'s tables with the cards this state can see.
    pub(crate) fn observe(&mut self, player: &str, cards: &[Card]) {
        let tables = cards.iter().map(|card| Candidates::only(*card)).collect();
        self.hands.insert(player.to_string(), tables);
    }

    pub(crate) fn take_recent(&mut self) -> BTreeSet<usize> {
        std::mem::take(&mut self.recent)
    }
}
