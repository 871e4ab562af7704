use crate::model::card::{Card, CardId};
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const CARDS_PER_DECK: usize = 54;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// `decks` full 54-card decks, ids assigned in construction order.
    pub fn standard(decks: usize) -> Self {
        let mut cards = Vec::with_capacity(decks * CARDS_PER_DECK);
        let mut next_id: CardId = 0;
        let mut push = |rank: Rank, suit: Suit| {
            cards.push(Card::new(next_id, rank, suit));
            next_id += 1;
        };
        for _ in 0..decks {
            for suit in Suit::ORDINARY.iter().copied() {
                for rank in Rank::DESCENDING.iter().rev().copied() {
                    push(rank, suit);
                }
            }
            push(Rank::SmallJoker, Suit::Joker);
            push(Rank::BigJoker, Suit::Joker);
        }
        Self { cards }
    }

    /// Wraps a sequence shuffled elsewhere; the order is dealt as given.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(decks: usize, rng: &mut R) -> Self {
        let mut deck = Self::standard(decks);
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(decks: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(decks, &mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
