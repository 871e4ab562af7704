//! Per-seat projections of match state with hidden cards redacted.

use serde::Serialize;
use shengji_core::game::match_state::MatchState;
use shengji_core::model::card::{Card, CardId};
use shengji_core::model::player::PlayerPosition;
use shengji_core::model::round::RoundPhase;
use shengji_core::model::trick::Trick;

pub const UNKNOWN: &str = "unknown";

/// A card as one observer sees it. Ids stay visible so clients can track
/// cards moving between zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub suit: String,
    pub rank: String,
}

impl CardView {
    pub fn visible(card: Card) -> Self {
        Self {
            id: card.id,
            suit: card.suit.as_str().to_string(),
            rank: card.rank.as_str().to_string(),
        }
    }

    pub fn hidden(card: Card) -> Self {
        Self {
            id: card.id,
            suit: UNKNOWN.to_string(),
            rank: UNKNOWN.to_string(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.suit == UNKNOWN
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub seat: PlayerPosition,
    pub level: u8,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayView {
    pub seat: PlayerPosition,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub match_id: String,
    pub seat: PlayerPosition,
    pub deal_number: u32,
    pub phase: RoundPhase,
    pub trump_rank: String,
    /// `None` until someone declares.
    pub trump_suit: Option<String>,
    pub declarer: Option<PlayerPosition>,
    pub seats: Vec<SeatView>,
    pub kitty: Vec<CardView>,
    pub current_trick: Vec<PlayView>,
    pub current_winner: Option<PlayerPosition>,
    pub attacker_points: u32,
    pub expected_to_play: Option<PlayerPosition>,
}

impl PlayerView {
    pub fn project(match_id: &str, state: &MatchState, seat: PlayerPosition) -> Self {
        let round = state.round();
        let declarer = round.declarer();
        let seats = PlayerPosition::LOOP
            .iter()
            .map(|owner| SeatView {
                seat: *owner,
                level: state.levels().level(*owner),
                cards: round
                    .hand(*owner)
                    .iter()
                    .map(|card| redact(*card, *owner == seat))
                    .collect(),
            })
            .collect();

        let kitty_visible = declarer == Some(seat) || round.phase() == RoundPhase::Finished;
        let kitty = round
            .kitty()
            .iter()
            .map(|card| redact(*card, kitty_visible))
            .collect();

        Self {
            match_id: match_id.to_string(),
            seat,
            deal_number: state.deal_number(),
            phase: round.phase(),
            trump_rank: round.order().trump_rank().as_str().to_string(),
            trump_suit: declarer.map(|_| round.order().trump_suit().as_str().to_string()),
            declarer,
            seats,
            kitty,
            current_trick: trick_view(round.current_trick()),
            current_winner: round.current_trick().current_winner(),
            attacker_points: round.attacker_points(),
            expected_to_play: round.expected_to_play(),
        }
    }
}

fn redact(card: Card, visible: bool) -> CardView {
    if visible {
        CardView::visible(card)
    } else {
        CardView::hidden(card)
    }
}

fn trick_view(trick: &Trick) -> Vec<PlayView> {
    trick
        .plays()
        .iter()
        .map(|play| PlayView {
            seat: play.position,
            cards: play.cards.iter().copied().map(CardView::visible).collect(),
        })
        .collect()
}
