//! Fan-out of a public hint into per-viewer table updates.
//!
//! A hint is broadcast to the whole table, so every player whose view of the
//! target hand is built from hints narrows it the same way. Views built from
//! seeing the cards directly are left alone; snapshots keep those current.

use crate::card::Clue;

use super::KnowledgeError;
use super::candidates::Candidates;

/// One hint as broadcast by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint<'a> {
    pub destination: &'a str,
    pub clue: Clue,
    /// Slots in the destination's hand that match the clue.
    pub positions: &'a [usize],
}

/// Narrow `viewer`'s table for `owner`'s `slot` to the cells in `keep`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeliefUpdate {
    pub viewer: String,
    pub owner: String,
    pub slot: usize,
    pub keep: Candidates,
}

/// Compute every table update a hint implies.
///
/// The destination always narrows its own view. When the destination is the
/// agent, every player's model of the agent's hand is hint-built too, so all
/// of them receive the update.
pub fn hint_updates(
    agent: &str,
    roster: &[String],
    hint: &Hint<'_>,
    hand_len: usize,
) -> Result<Vec<BeliefUpdate>, KnowledgeError> {
    let owner = hint.destination;
    if !roster.iter().any(|p| p == owner) {
        return Err(KnowledgeError::UnknownPlayer(owner.to_string()));
    }
    if let Some(&slot) = hint.positions.iter().find(|&&slot| slot >= hand_len) {
        return Err(KnowledgeError::SlotOutOfRange {
            owner: owner.to_string(),
            slot,
            len: hand_len,
        });
    }

    let matching = Candidates::matching(hint.clue);
    let rest = matching.complement();

    let updates = roster
        .iter()
        .filter(|viewer| owner == agent || viewer.as_str() == owner)
        .flat_map(|viewer| {
            (0..hand_len).map(move |slot| BeliefUpdate {
                viewer: viewer.clone(),
                owner: owner.to_string(),
                slot,
                keep: if hint.positions.contains(&slot) { matching } else { rest },
            })
        })
        .collect();
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Color, Rank};

    fn roster() -> Vec<String> {
        ["a", "b", "c"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hint_to_other_player_touches_only_their_view() {
        let hint = Hint {
            destination: "c",
            clue: Clue::Rank(Rank::TWO),
            positions: &[1],
        };
        let updates = hint_updates("a", &roster(), &hint, 3).unwrap();
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|u| u.viewer == "c" && u.owner == "c"));
        assert_eq!(updates[1].keep, Candidates::matching(Clue::Rank(Rank::TWO)));
        assert_eq!(updates[0].keep, Candidates::not_matching(Clue::Rank(Rank::TWO)));
    }

    #[test]
    fn hint_to_agent_fans_out_to_everyone() {
        let hint = Hint {
            destination: "a",
            clue: Clue::Color(Color::Blue),
            positions: &[0, 3],
        };
        let updates = hint_updates("a", &roster(), &hint, 4).unwrap();
        assert_eq!(updates.len(), 12);
        for viewer in ["a", "b", "c"] {
            let slots: Vec<_> = updates.iter().filter(|u| u.viewer == viewer).collect();
            assert_eq!(slots.len(), 4);
            assert!(slots[0].keep.iter().all(|c| c.color == Color::Blue));
            assert!(slots[1].keep.iter().all(|c| c.color != Color::Blue));
        }
    }

    #[test]
    fn rejects_bad_input() {
        let hint = Hint {
            destination: "zed",
            clue: Clue::Rank(Rank::ONE),
            positions: &[],
        };
        assert!(matches!(
            hint_updates("a", &roster(), &hint, 4),
            Err(KnowledgeError::UnknownPlayer(name)) if name == "zed"
        ));

        let hint = Hint {
            destination: "b",
            clue: Clue::Rank(Rank::ONE),
            positions: &[4],
        };
        assert!(matches!(
            hint_updates("a", &roster(), &hint, 4),
            Err(KnowledgeError::SlotOutOfRange { slot: 4, len: 4, .. })
        ));
    }
}
