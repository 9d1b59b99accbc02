use std::fmt;

use crate::card::{Card, Clue, Color, Rank};

/// The set of cards a slot may still hold: a 5x5 boolean table over
/// (rank, color), packed into the low 25 bits of a `u32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidates(u32);

impl Candidates {
    /// Every card is still possible.
    pub const FULL: Candidates = Candidates((1 << 25) - 1);
    pub const EMPTY: Candidates = Candidates(0);

    fn bit(card: Card) -> u32 {
        1 << (card.rank.index() * 5 + card.color.index())
    }

    /// The singleton table holding only `card`.
    pub fn only(card: Card) -> Self {
        Candidates(Self::bit(card))
    }

    /// All cells the clue points at.
    pub fn matching(clue: Clue) -> Self {
        let bits = Card::all()
            .filter(|card| clue.matches(*card))
            .fold(0, |acc, card| acc | Self::bit(card));
        Candidates(bits)
    }

    /// All cells the clue does not point at.
    pub fn not_matching(clue: Clue) -> Self {
        Self::matching(clue).complement()
    }

    pub fn complement(self) -> Self {
        Candidates(Self::FULL.0 & !self.0)
    }

    pub fn intersect(self, other: Candidates) -> Self {
        Candidates(self.0 & other.0)
    }

    pub fn without(self, card: Card) -> Self {
        Candidates(self.0 & !Self::bit(card))
    }

    pub fn contains(self, card: Card) -> bool {
        self.0 & Self::bit(card) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The card this table has collapsed to, if exactly one remains.
    pub fn single(self) -> Option<Card> {
        if self.0.count_ones() != 1 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        Some(Card::new(
            Color::from_index(index % 5)?,
            Rank::from_index(index / 5)?,
        ))
    }

    pub fn is_determined(self) -> bool {
        self.len() == 1
    }

    /// Remaining candidates, rank-major.
    pub fn iter(self) -> impl Iterator<Item = Card> {
        Card::all().filter(move |card| self.contains(*card))
    }
}

impl Default for Candidates {
    fn default() -> Self {
        Self::FULL
    }
}

impl FromIterator<Card> for Candidates {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Candidates(iter.into_iter().fold(0, |acc, card| acc | Self::bit(card)))
    }
}

impl fmt::Debug for Candidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|c| c.to_string())).finish()
    }
}

/// Renders the table as a rank-by-color grid.
impl fmt::Display for Candidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for color in Color::ALL {
            write!(f, " {}", color.letter())?;
        }
        for rank in Rank::ALL {
            write!(f, "\n{rank}")?;
            for color in Color::ALL {
                let cell = if self.contains(Card::new(color, rank)) { 'x' } else { '.' };
                write!(f, " {cell}")?;
            }
        }
        Ok(())
    }
}
