use crate::model::card::{Card, CardId, total_points};
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::legality::{LegalityFailure, suggest_follow};
use crate::model::order::{Order, OrderError};
use crate::model::player::{PlayerPosition, Team};
use crate::model::rank::Rank;
use crate::model::score::{kitty_bonus, kitty_multiplier};
use crate::model::suit::Suit;
use crate::model::trick::{Trick, TrickError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::array;
use thiserror::Error;
use tracing::{debug, info};

/// One deal: declaration, burying the kitty, then trick play until every
/// hand is empty.
#[derive(Debug, Clone)]
pub struct RoundState {
    order: Order,
    hands: [Hand; 4],
    kitty: Vec<Card>,
    kitty_size: usize,
    current_trick: Trick,
    trick_history: Vec<Trick>,
    starting_player: PlayerPosition,
    declarer: Option<PlayerPosition>,
    phase: RoundPhase,
    attacker_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Declaring,
    Burying,
    Playing,
    Finished,
}

/// Result of a finished deal, before levels are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealSettlement {
    pub declarer: PlayerPosition,
    pub attackers: Team,
    /// Trick points captured by the attackers.
    pub trick_points: u32,
    pub kitty_points: u32,
    pub last_trick_winner: PlayerPosition,
    /// Zero when the defenders keep the kitty.
    pub kitty_multiplier: u32,
    pub kitty_bonus: u32,
    pub attacker_score: i32,
}

impl RoundState {
    /// Deals round-robin from `starting_player`, setting the last
    /// `kitty_size` cards aside.
    pub fn deal(
        deck: &Deck,
        trump_rank: Rank,
        starting_player: PlayerPosition,
        kitty_size: usize,
    ) -> Result<Self, DealError> {
        let cards = deck.cards();
        if kitty_size == 0 || cards.len() <= kitty_size || (cards.len() - kitty_size) % 4 != 0 {
            return Err(DealError::UnevenDeal {
                cards: cards.len(),
                kitty: kitty_size,
            });
        }
        let order = Order::new(trump_rank, Suit::Joker)?;

        let (dealt, kitty) = cards.split_at(cards.len() - kitty_size);
        let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
        for (index, card) in dealt.iter().enumerate() {
            let seat = (starting_player.index() + index) % 4;
            hands[seat].add(*card);
        }

        Ok(Self {
            order,
            hands,
            kitty: kitty.to_vec(),
            kitty_size,
            current_trick: Trick::new(starting_player),
            trick_history: Vec::new(),
            starting_player,
            declarer: None,
            phase: RoundPhase::Declaring,
            attacker_points: 0,
        })
    }

    /// A deal already past declaration and burying, for replaying fixed
    /// positions.
    pub fn from_hands(
        order: Order,
        hands: [Vec<Card>; 4],
        kitty: Vec<Card>,
        declarer: PlayerPosition,
        starting_player: PlayerPosition,
    ) -> Self {
        Self {
            order,
            hands: hands.map(Hand::with_cards),
            kitty_size: kitty.len(),
            kitty,
            current_trick: Trick::new(starting_player),
            trick_history: Vec::new(),
            starting_player,
            declarer: Some(declarer),
            phase: RoundPhase::Playing,
            attacker_points: 0,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }

    pub fn kitty_size(&self) -> usize {
        self.kitty_size
    }

    pub fn declarer(&self) -> Option<PlayerPosition> {
        self.declarer
    }

    /// The declarer's team defends.
    pub fn defenders(&self) -> Option<Team> {
        self.declarer.map(PlayerPosition::team)
    }

    pub fn attackers(&self) -> Option<Team> {
        self.defenders().map(Team::other)
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[Trick] {
        &self.trick_history
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn starting_player(&self) -> PlayerPosition {
        self.starting_player
    }

    pub fn attacker_points(&self) -> u32 {
        self.attacker_points
    }

    pub fn expected_to_play(&self) -> Option<PlayerPosition> {
        (self.phase == RoundPhase::Playing).then(|| self.current_trick.expected_position())
    }

    /// Whether `seat` holds what declaring `trump_suit` requires: a trump-rank
    /// card of that suit, or a pair of identical jokers for no trump suit.
    pub fn can_declare(&self, seat: PlayerPosition, trump_suit: Suit) -> bool {
        let hand = self.hand(seat);
        if trump_suit.is_joker() {
            return [Rank::SmallJoker, Rank::BigJoker].into_iter().any(|rank| {
                hand.iter().filter(|card| card.rank == rank).count() >= 2
            });
        }
        let trump_rank = self.order.trump_rank();
        hand.iter()
            .any(|card| card.rank == trump_rank && card.suit == trump_suit)
    }

    pub fn declare(&mut self, seat: PlayerPosition, trump_suit: Suit) -> Result<(), DealError> {
        self.expect_phase(RoundPhase::Declaring)?;
        if !self.can_declare(seat, trump_suit) {
            return Err(DealError::CannotDeclare {
                seat,
                suit: trump_suit,
            });
        }

        self.order.reset(trump_suit);
        self.declarer = Some(seat);
        let kitty = std::mem::take(&mut self.kitty);
        self.hands[seat.index()].extend(kitty);
        self.phase = RoundPhase::Burying;
        info!(%seat, suit = trump_suit.as_str(), "trump declared");
        Ok(())
    }

    /// The declarer returns exactly `kitty_size` cards face down.
    pub fn bury(&mut self, seat: PlayerPosition, card_ids: &[CardId]) -> Result<(), DealError> {
        self.expect_phase(RoundPhase::Burying)?;
        let declarer = self.declarer.ok_or(DealError::WrongPhase {
            expected: RoundPhase::Burying,
            actual: self.phase,
        })?;
        if seat != declarer {
            return Err(DealError::NotDeclarer {
                declarer,
                actual: seat,
            });
        }
        if card_ids.len() != self.kitty_size {
            return Err(DealError::KittySize {
                expected: self.kitty_size,
                actual: card_ids.len(),
            });
        }
        let cards = resolve_ids(&self.hands[seat.index()], card_ids).map_err(|issue| match issue {
            IdIssue::Missing(card) => DealError::CardNotInHand { seat, card },
            IdIssue::Duplicate(card) => DealError::DuplicateCard(card),
        })?;

        let hand = &mut self.hands[seat.index()];
        for card in &cards {
            hand.remove(*card);
        }
        self.kitty = cards;
        self.phase = RoundPhase::Playing;
        debug!(%seat, "kitty buried");
        Ok(())
    }

    pub fn play(&mut self, seat: PlayerPosition, card_ids: &[CardId]) -> Result<PlayOutcome, PlayError> {
        if self.phase != RoundPhase::Playing {
            return Err(PlayError::NotInPlayPhase);
        }
        let mut cards = Vec::with_capacity(card_ids.len());
        for &id in card_ids {
            let card = self.hands[seat.index()]
                .find(id)
                .ok_or(PlayError::CardNotInHand { seat, card: id })?;
            cards.push(card);
        }

        self.current_trick
            .try_play(&self.order, seat, &self.hands[seat.index()], &cards)?;
        let hand = &mut self.hands[seat.index()];
        for card in &cards {
            hand.remove(*card);
        }

        let Some(winner) = self.current_trick.winner() else {
            return Ok(PlayOutcome::Played);
        };
        let points = self.current_trick.score();
        if self.attackers().is_some_and(|team| team.contains(winner)) {
            self.attacker_points += points;
        }
        let finished = std::mem::replace(&mut self.current_trick, Trick::new(winner));
        self.trick_history.push(finished);
        debug!(%winner, points, trick = self.trick_history.len(), "trick completed");

        if self.hands.iter().all(Hand::is_empty) {
            self.phase = RoundPhase::Finished;
            info!(
                %winner,
                attacker_points = self.attacker_points,
                tricks = self.trick_history.len(),
                "deal finished"
            );
            return Ok(PlayOutcome::DealFinished { winner, points });
        }
        Ok(PlayOutcome::TrickCompleted { winner, points })
    }

    /// A legal play for `seat` when it is their turn: the first card of the
    /// hand on a lead, otherwise the same cards a rejection would hint.
    pub fn suggested_play(&self, seat: PlayerPosition) -> Option<Vec<Card>> {
        if self.expected_to_play()? != seat {
            return None;
        }
        let hand = self.hand(seat);
        match self.current_trick.lead() {
            None => hand.cards().first().map(|card| vec![*card]),
            Some(lead) => Some(suggest_follow(&self.order, &lead.format, hand)),
        }
    }

    pub fn settlement(&self) -> Result<DealSettlement, DealError> {
        self.expect_phase(RoundPhase::Finished)?;
        let (Some(declarer), Some(attackers)) = (self.declarer, self.attackers()) else {
            return Err(DealError::WrongPhase {
                expected: RoundPhase::Finished,
                actual: self.phase,
            });
        };
        let last = self.trick_history.last().ok_or(DealError::WrongPhase {
            expected: RoundPhase::Finished,
            actual: self.phase,
        })?;
        let winning = last.winning_play().ok_or(DealError::WrongPhase {
            expected: RoundPhase::Finished,
            actual: self.phase,
        })?;

        let kitty_points = total_points(&self.kitty);
        let capturing = winning.format.largest_unit();
        let (multiplier, bonus) = match capturing {
            Some(unit) if attackers.contains(winning.position) => {
                (kitty_multiplier(&unit), kitty_bonus(kitty_points, &unit))
            }
            _ => (0, 0),
        };

        Ok(DealSettlement {
            declarer,
            attackers,
            trick_points: self.attacker_points,
            kitty_points,
            last_trick_winner: winning.position,
            kitty_multiplier: multiplier,
            kitty_bonus: bonus,
            attacker_score: (self.attacker_points + bonus) as i32,
        })
    }

    fn expect_phase(&self, expected: RoundPhase) -> Result<(), DealError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DealError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }
}

enum IdIssue {
    Missing(CardId),
    Duplicate(CardId),
}

fn resolve_ids(hand: &Hand, ids: &[CardId]) -> Result<Vec<Card>, IdIssue> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(|&id| {
            if !seen.insert(id) {
                return Err(IdIssue::Duplicate(id));
            }
            hand.find(id).ok_or(IdIssue::Missing(id))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: PlayerPosition, points: u32 },
    DealFinished { winner: PlayerPosition, points: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("{cards} cards cannot be dealt evenly to four players with a kitty of {kitty}")]
    UnevenDeal { cards: usize, kitty: usize },
    #[error("deal is in phase {actual:?}, expected {expected:?}")]
    WrongPhase {
        expected: RoundPhase,
        actual: RoundPhase,
    },
    #[error("{seat} cannot declare {suit:?}")]
    CannotDeclare { seat: PlayerPosition, suit: Suit },
    #[error("only the declarer {declarer} may bury, not {actual}")]
    NotDeclarer {
        declarer: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("kitty must hold exactly {expected} cards, got {actual}")]
    KittySize { expected: usize, actual: usize },
    #[error("card {card} is not in {seat}'s hand")]
    CardNotInHand { seat: PlayerPosition, card: CardId },
    #[error("card {0} was listed twice")]
    DuplicateCard(CardId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("cards can only be played once the kitty is buried")]
    NotInPlayPhase,
    #[error("card {card} is not in {seat}'s hand")]
    CardNotInHand { seat: PlayerPosition, card: CardId },
    #[error(transparent)]
    Trick(#[from] TrickError),
}

impl PlayError {
    pub fn legality(&self) -> Option<&LegalityFailure> {
        match self {
            PlayError::Trick(error) => error.legality(),
            _ => None,
        }
    }
}
