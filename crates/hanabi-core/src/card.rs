//! Card domain: colors, ranks, clues, and deck composition.
//!
//! # Examples
//!
//! ```
//! use hanabi_core::card::{Card, Clue, Color, Rank};
//!
//! let card = Card::new(Color::Red, Rank::ONE);
//! assert!(Clue::Color(Color::Red).matches(card));
//! assert!(!Clue::Rank(Rank::FIVE).matches(card));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five firework colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
    White,
}

impl Color {
    /// All colors in table order.
    pub const ALL: [Color; 5] = [
        Color::Red,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::White,
    ];

    /// Position of the color in [`Color::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Single-letter label used in compact renderings.
    pub fn letter(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Yellow => 'Y',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::White => 'W',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::White => "white",
        };
        f.write_str(name)
    }
}

/// A card rank in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rank(u8);

impl Rank {
    pub const ONE: Rank = Rank(1);
    pub const TWO: Rank = Rank(2);
    pub const THREE: Rank = Rank(3);
    pub const FOUR: Rank = Rank(4);
    pub const FIVE: Rank = Rank(5);

    /// All ranks in ascending order.
    pub const ALL: [Rank; 5] = [Rank::ONE, Rank::TWO, Rank::THREE, Rank::FOUR, Rank::FIVE];

    /// Returns `None` outside `1..=5`.
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Rank(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Position of the rank in [`Rank::ALL`].
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Number of copies of a card with this rank in each color.
    pub fn copies(self) -> u8 {
        match self.0 {
            1 => 3,
            5 => 1,
            _ => 2,
        }
    }
}

impl TryFrom<u8> for Rank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::new(value).ok_or_else(|| format!("card rank must be 1..=5, got {value}"))
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single card. Immutable once dealt into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    pub rank: Rank,
}

impl Card {
    pub fn new(color: Color, rank: Rank) -> Self {
        Self { color, rank }
    }

    /// Iterates the 25 distinct cards, rank-major.
    pub fn all() -> impl Iterator<Item = Card> {
        Rank::ALL
            .into_iter()
            .flat_map(|rank| Color::ALL.into_iter().map(move |color| Card::new(color, rank)))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.letter(), self.rank)
    }
}

/// The information carried by a hint: one color or one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Clue {
    Color(Color),
    Rank(Rank),
}

impl Clue {
    /// Returns true if `card` is one of the cards this clue points at.
    pub fn matches(self, card: Card) -> bool {
        match self {
            Clue::Color(color) => card.color == color,
            Clue::Rank(rank) => card.rank == rank,
        }
    }
}

impl fmt::Display for Clue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clue::Color(color) => write!(f, "color={color}"),
            Clue::Rank(rank) => write!(f, "rank={rank}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_bounds() {
        assert!(Rank::new(0).is_none());
        assert!(Rank::new(6).is_none());
        assert_eq!(Rank::new(3), Some(Rank::THREE));
        assert_eq!(Rank::FIVE.index(), 4);
    }

    #[test]
    fn deck_composition_adds_up() {
        let total: usize = Card::all().map(|card| usize::from(card.rank.copies())).sum();
        assert_eq!(total, 50);
        assert_eq!(Card::all().count(), 25);
    }

    #[test]
    fn clue_matching() {
        let blue_three = Card::new(Color::Blue, Rank::THREE);
        assert!(Clue::Color(Color::Blue).matches(blue_three));
        assert!(Clue::Rank(Rank::THREE).matches(blue_three));
        assert!(!Clue::Color(Color::Red).matches(blue_three));
    }

    #[test]
    fn clue_wire_shape() {
        let json = serde_json::to_string(&Clue::Color(Color::Green)).unwrap();
        assert_eq!(json, r#"{"kind":"color","value":"green"}"#);
        let clue: Clue = serde_json::from_str(r#"{"kind":"rank","value":4}"#).unwrap();
        assert_eq!(clue, Clue::Rank(Rank::FOUR));
        assert!(serde_json::from_str::<Clue>(r#"{"kind":"rank","value":9}"#).is_err());
    }

    #[test]
    fn card_display() {
        assert_eq!(Card::new(Color::White, Rank::TWO).to_string(), "W2");
    }
}
