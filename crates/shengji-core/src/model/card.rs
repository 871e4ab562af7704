use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Identifies one physical card. Combined decks hold several cards with the
/// same suit and rank, so identity never comes from the face alone.
pub type CardId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(id: CardId, rank: Rank, suit: Suit) -> Self {
        Self { id, rank, suit }
    }

    pub const fn small_joker(id: CardId) -> Self {
        Self::new(id, Rank::SmallJoker, Suit::Joker)
    }

    pub const fn big_joker(id: CardId) -> Self {
        Self::new(id, Rank::BigJoker, Suit::Joker)
    }

    pub const fn is_joker(self) -> bool {
        self.suit.is_joker()
    }

    /// Same face as `other`, regardless of which deck either card came from.
    pub fn matches(&self, other: &Card) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }

    pub const fn points(self) -> u32 {
        self.rank.points()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_joker() {
            write!(f, "{}", self.rank)
        } else {
            write!(f, "{}{}", self.rank, self.suit)
        }
    }
}

pub fn total_points(cards: &[Card]) -> u32 {
    cards.iter().map(|card| card.points()).sum()
}
