//! Move selection.
//!
//! The decision worker only depends on the [`MoveChooser`] trait. The agent
//! binary ships with [`CautiousChooser`], a small rule-based policy that
//! works purely off the belief model.

use thiserror::Error;

use hanabi_core::card::{Card, Clue};
use hanabi_core::knowledge::Candidates;
use hanabi_core::protocol::{Action, GameSnapshot, MAX_NOTE_TOKENS};

use crate::turn::TurnContext;

#[derive(Debug, Error)]
pub enum ChooserError {
    #[error("no legal move available")]
    NoLegalMove,

    #[error("{0}")]
    Other(String),
}

/// Picks the agent's action for one turn.
pub trait MoveChooser: Send + 'static {
    fn choose(&mut self, turn: &TurnContext) -> Result<Action, ChooserError>;
}

impl<F> MoveChooser for F
where
    F: FnMut(&TurnContext) -> Result<Action, ChooserError> + Send + 'static,
{
    fn choose(&mut self, turn: &TurnContext) -> Result<Action, ChooserError> {
        self(turn)
    }
}

/// Plays only what it is sure of, hints playable cards, and otherwise
/// discards what it knows least about.
#[derive(Debug, Default, Clone, Copy)]
pub struct CautiousChooser;

fn all_playable(table: Candidates, snapshot: &GameSnapshot) -> bool {
    !table.is_empty() && table.iter().all(|card| snapshot.is_playable(card))
}

fn is_dead(card: Card, snapshot: &GameSnapshot) -> bool {
    card.rank.value() <= snapshot.fireworks()[card.color.index()]
}

impl CautiousChooser {
    /// A rank hint that points another player at a playable card they do not
    /// already know is playable. Players are tried in turn order after us.
    fn useful_hint(&self, turn: &TurnContext) -> Option<Action> {
        let knowledge = &turn.knowledge;
        let roster = knowledge.roster();
        let me = roster.iter().position(|p| p == knowledge.agent())?;
        let others = roster.iter().cycle().skip(me + 1).take(roster.len() - 1);

        for player in others {
            let Some(hand) = turn.snapshot.hand_of(player) else {
                continue;
            };
            let their_view = knowledge.mental_state(player);
            for (slot, card) in hand.cards.iter().enumerate() {
                if !turn.snapshot.is_playable(*card) {
                    continue;
                }
                let known = their_view
                    .and_then(|m| m.slot(player, slot))
                    .is_some_and(|table| all_playable(table, &turn.snapshot));
                if !known {
                    return Some(Action::Hint {
                        target: player.clone(),
                        clue: Clue::Rank(card.rank),
                    });
                }
            }
        }
        None
    }

    fn any_hint(&self, turn: &TurnContext) -> Option<Action> {
        let agent = turn.knowledge.agent();
        turn.snapshot
            .players
            .iter()
            .filter(|hand| hand.name != agent)
            .find_map(|hand| {
                hand.cards.first().map(|card| Action::Hint {
                    target: hand.name.clone(),
                    clue: Clue::Color(card.color),
                })
            })
    }
}

impl MoveChooser for CautiousChooser {
    fn choose(&mut self, turn: &TurnContext) -> Result<Action, ChooserError> {
        let snapshot = &turn.snapshot;
        let own = turn.knowledge.own_hand();

        if let Some(slot) = own.iter().position(|t| all_playable(*t, snapshot)) {
            return Ok(Action::Play(slot));
        }

        if snapshot.note_tokens > 0
            && let Some(hint) = self.useful_hint(turn)
        {
            return Ok(hint);
        }

        if snapshot.note_tokens < MAX_NOTE_TOKENS && !own.is_empty() {
            let slot = own
                .iter()
                .position(|t| t.iter().all(|card| is_dead(card, snapshot)))
                .or_else(|| own.iter().position(|t| !t.is_determined()))
                .unwrap_or(0);
            return Ok(Action::Discard(slot));
        }

        if snapshot.note_tokens > 0 {
            return self.any_hint(turn).ok_or(ChooserError::NoLegalMove);
        }
        Err(ChooserError::NoLegalMove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanabi_core::card::{Color, Rank};
    use hanabi_core::knowledge::{Hint, Knowledge};
    use hanabi_core::protocol::PlayerHand;

    fn c(color: Color, rank: u8) -> Card {
        Card::new(color, Rank::new(rank).unwrap())
    }

    fn turn(carol: Vec<Card>, note_tokens: u8, played: Vec<Card>) -> TurnContext {
        let roster: Vec<String> = ["alice", "bob", "carol"].iter().map(|s| s.to_string()).collect();
        let snapshot = GameSnapshot {
            current_player: "bob".into(),
            players: vec![
                PlayerHand {
                    name: "alice".into(),
                    cards: vec![c(Color::White, 4), c(Color::White, 3)],
                },
                PlayerHand {
                    name: "carol".into(),
                    cards: carol,
                },
            ],
            hand_size: 3,
            played,
            discarded: Vec::new(),
            note_tokens,
            storm_tokens: 0,
        };
        let knowledge = Knowledge::new("bob", &roster, &snapshot).unwrap();
        TurnContext {
            knowledge,
            snapshot,
        }
    }

    #[test]
    fn plays_a_card_known_to_be_playable() {
        let mut t = turn(vec![c(Color::Green, 4)], 8, Vec::new());
        t.knowledge
            .apply_hint(&Hint {
                destination: "bob",
                clue: Clue::Rank(Rank::ONE),
                positions: &[2],
            })
            .unwrap();
        assert_eq!(CautiousChooser.choose(&t).unwrap(), Action::Play(2));
    }

    #[test]
    fn hints_the_next_player_with_a_playable_card() {
        let t = turn(vec![c(Color::Green, 4), c(Color::Blue, 1)], 3, Vec::new());
        assert_eq!(
            CautiousChooser.choose(&t).unwrap(),
            Action::Hint {
                target: "carol".into(),
                clue: Clue::Rank(Rank::ONE),
            }
        );
    }

    #[test]
    fn skips_cards_the_holder_already_knows() {
        let mut t = turn(vec![c(Color::Blue, 1)], 3, Vec::new());
        t.knowledge
            .apply_hint(&Hint {
                destination: "carol",
                clue: Clue::Rank(Rank::ONE),
                positions: &[0],
            })
            .unwrap();
        // Nothing else to hint, so it discards.
        assert_eq!(CautiousChooser.choose(&t).unwrap(), Action::Discard(0));
    }

    #[test]
    fn discards_dead_cards_first() {
        let mut t = turn(vec![c(Color::Green, 4)], 0, vec![c(Color::Red, 1), c(Color::Red, 2)]);
        t.knowledge
            .apply_hint(&Hint {
                destination: "bob",
                clue: Clue::Color(Color::Red),
                positions: &[1],
            })
            .unwrap();
        t.knowledge
            .apply_hint(&Hint {
                destination: "bob",
                clue: Clue::Rank(Rank::TWO),
                positions: &[1],
            })
            .unwrap();
        assert_eq!(CautiousChooser.choose(&t).unwrap(), Action::Discard(1));
    }

    #[test]
    fn looks_past_players_with_nothing_playable() {
        let t = turn(vec![c(Color::Green, 4)], 8, vec![c(Color::White, 1), c(Color::White, 2)]);
        assert_eq!(
            CautiousChooser.choose(&t).unwrap(),
            Action::Hint {
                target: "alice".into(),
                clue: Clue::Rank(Rank::THREE),
            }
        );
    }

    #[test]
    fn full_tokens_force_a_hint() {
        let t = turn(vec![c(Color::Green, 4)], 8, Vec::new());
        assert_eq!(
            CautiousChooser.choose(&t).unwrap(),
            Action::Hint {
                target: "alice".into(),
                clue: Clue::Color(Color::White),
            }
        );
    }

    #[test]
    fn closures_are_choosers() {
        let mut chooser = |_: &TurnContext| -> Result<Action, ChooserError> {
            Err(ChooserError::Other("offline".into()))
        };
        let t = turn(vec![c(Color::Green, 4)], 8, Vec::new());
        assert!(matches!(
            MoveChooser::choose(&mut chooser, &t),
            Err(ChooserError::Other(_))
        ));
    }
}
