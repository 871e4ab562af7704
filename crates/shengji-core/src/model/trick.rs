use crate::model::card::{Card, CardId, total_points};
use crate::model::format::Format;
use crate::model::hand::Hand;
use crate::model::legality::{Complement, LegalityFailure, check_follow, check_lead};
use crate::model::order::Order;
use crate::model::player::PlayerPosition;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct Trick {
    leader: PlayerPosition,
    plays: Vec<Play>,
    best: Option<usize>,
    score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Play {
    pub position: PlayerPosition,
    pub cards: Vec<Card>,
    pub format: Format,
    /// How each lead unit was answered; empty for the lead itself.
    pub complements: Vec<Complement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} has already played this trick")]
    AlreadyPlayed(PlayerPosition),
    #[error("a play needs at least one card")]
    EmptyPlay,
    #[error("card {card} is not in {position}'s hand")]
    CardNotInHand {
        position: PlayerPosition,
        card: CardId,
    },
    #[error("card {0} was submitted twice")]
    DuplicateCard(CardId),
    #[error(transparent)]
    Illegal(#[from] LegalityFailure),
}

impl TrickError {
    /// The rules violation behind this error, if it is one rather than a
    /// bookkeeping mistake by the caller.
    pub fn legality(&self) -> Option<&LegalityFailure> {
        match self {
            TrickError::Illegal(failure) => Some(failure),
            _ => None,
        }
    }
}

impl Trick {
    pub fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(4),
            best: None,
            score: 0,
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn lead(&self) -> Option<&Play> {
        self.plays.first()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 4
    }

    pub fn is_done(&self) -> bool {
        self.is_complete()
    }

    /// Points on the table so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Validates and records a play. A rejected play leaves the trick
    /// untouched.
    pub fn try_play(
        &mut self,
        order: &Order,
        position: PlayerPosition,
        hand: &Hand,
        cards: &[Card],
    ) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        if self.plays.iter().any(|play| play.position == position) {
            return Err(TrickError::AlreadyPlayed(position));
        }

        let expected = self.expected_position();
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        if cards.is_empty() {
            return Err(TrickError::EmptyPlay);
        }
        let mut seen = HashSet::with_capacity(cards.len());
        for card in cards {
            if !seen.insert(card.id) {
                return Err(TrickError::DuplicateCard(card.id));
            }
            if !hand.contains(*card) {
                return Err(TrickError::CardNotInHand {
                    position,
                    card: card.id,
                });
            }
        }

        let outcome = match self.plays.first() {
            None => check_lead(order, cards).map(|format| (format, Vec::new())),
            Some(lead) => check_follow(order, &lead.format, hand, cards)
                .map(|complements| (Format::create(order, cards), complements)),
        };
        let (format, complements) = outcome.inspect_err(|failure| {
            debug!(%position, title = %failure.title, "play rejected");
        })?;

        let index = self.plays.len();
        let takes_lead = match self.best {
            None => true,
            Some(best) => {
                let lead = &self.plays[0].format;
                format.contends_with(lead) && format.beats(&self.plays[best].format)
            }
        };
        if takes_lead {
            self.best = Some(index);
        }
        self.score += total_points(cards);
        self.plays.push(Play {
            position,
            cards: cards.to_vec(),
            format,
            complements,
        });
        Ok(())
    }

    /// Seat currently holding the trick.
    pub fn current_winner(&self) -> Option<PlayerPosition> {
        self.winning_play().map(|play| play.position)
    }

    pub fn winning_play(&self) -> Option<&Play> {
        self.best.map(|index| &self.plays[index])
    }

    pub fn winner(&self) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        self.current_winner()
    }

    pub fn expected_position(&self) -> PlayerPosition {
        self.plays
            .last()
            .map(|play| play.position.next())
            .unwrap_or(self.leader)
    }
}
