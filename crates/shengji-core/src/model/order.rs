//! Trump-aware strength ranking for one deal.
//!
//! Every distinct (suit, rank) face maps to a strength index where a lower
//! index is stronger. There are two tie classes: every off-suit
//! trump-rank card shares one index, and non-trump cards of the same game
//! rank share an index across suits. Callers only ever compare non-trump
//! cards within one suit, so the second tie never decides anything.

use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNRANKED: u8 = u8::MAX;
const RANK_SLOTS: usize = 16;

/// Cards that are compared with each other: all trumps form one family,
/// each ordinary suit's non-trump cards form another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Trump,
    Suit(Suit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("trump rank must be an ordinary rank, got {0:?}")]
    InvalidTrumpRank(Rank),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    trump_rank: Rank,
    trump_suit: Suit,
    table: [[u8; RANK_SLOTS]; 5],
}

impl Order {
    /// Builds the ranking for `trump_rank`; `Suit::Joker` as the trump suit
    /// means no ordinary suit is trump.
    pub fn new(trump_rank: Rank, trump_suit: Suit) -> Result<Self, OrderError> {
        if trump_rank.is_joker() {
            return Err(OrderError::InvalidTrumpRank(trump_rank));
        }
        let mut order = Self {
            trump_rank,
            trump_suit,
            table: [[UNRANKED; RANK_SLOTS]; 5],
        };
        order.rebuild();
        Ok(order)
    }

    /// Rebuilds the table after the trump suit changes. The trump rank is
    /// fixed for the lifetime of the order.
    pub fn reset(&mut self, trump_suit: Suit) {
        self.trump_suit = trump_suit;
        self.rebuild();
    }

    pub fn trump_rank(&self) -> Rank {
        self.trump_rank
    }

    pub fn trump_suit(&self) -> Suit {
        self.trump_suit
    }

    /// Strength index of `card`; lower is stronger.
    ///
    /// Panics when the card's face is outside the deck, which only happens
    /// when a card was constructed incorrectly.
    pub fn for_card(&self, card: Card) -> u8 {
        let index = self.table[card.suit.index()][card.rank.value() as usize];
        assert!(index != UNRANKED, "card {card:?} has no place in the order");
        index
    }

    pub fn is_trump(&self, card: Card) -> bool {
        card.is_joker()
            || card.rank == self.trump_rank
            || (!self.trump_suit.is_joker() && card.suit == self.trump_suit)
    }

    pub fn family(&self, card: Card) -> Family {
        if self.is_trump(card) {
            Family::Trump
        } else {
            Family::Suit(card.suit)
        }
    }

    fn rebuild(&mut self) {
        self.table = [[UNRANKED; RANK_SLOTS]; 5];
        let trump_rank = self.trump_rank;
        let trump_suit = self.trump_suit;
        let mut next = 0u8;

        self.set(Suit::Joker, Rank::BigJoker, next);
        next += 1;
        self.set(Suit::Joker, Rank::SmallJoker, next);
        next += 1;

        if !trump_suit.is_joker() {
            self.set(trump_suit, trump_rank, next);
            next += 1;
        }
        for suit in Suit::ORDINARY {
            if suit != trump_suit {
                self.set(suit, trump_rank, next);
            }
        }
        next += 1;

        if !trump_suit.is_joker() {
            for rank in Rank::DESCENDING {
                if rank != trump_rank {
                    self.set(trump_suit, rank, next);
                    next += 1;
                }
            }
        }

        for rank in Rank::DESCENDING {
            if rank == trump_rank {
                continue;
            }
            for suit in Suit::ORDINARY {
                if suit != trump_suit {
                    self.set(suit, rank, next);
                }
            }
            next += 1;
        }
    }

    fn set(&mut self, suit: Suit, rank: Rank, index: u8) {
        self.table[suit.index()][rank.value() as usize] = index;
    }
}
