//! Owns running matches and serializes every action against one match.
//!
//! Each match sits behind its own mutex; events are published while that
//! lock is held so observers see updates in the order state changed.

use crate::broadcast::{Broadcaster, Subscription};
use crate::error::CoordinatorError;
use crate::view::PlayerView;
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use shengji_core::game::config::RuleConfig;
use shengji_core::game::match_state::{DealOutcome, MatchState};
use shengji_core::game::serialization::MatchSnapshot;
use shengji_core::model::card::{Card, CardId};
use shengji_core::model::player::{PlayerPosition, Team};
use shengji_core::model::round::PlayOutcome;
use shengji_core::model::suit::Suit;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    Declared {
        seat: PlayerPosition,
        trump_suit: Suit,
    },
    KittyBuried {
        seat: PlayerPosition,
    },
    Played {
        seat: PlayerPosition,
        cards: Vec<Card>,
        outcome: PlayOutcome,
    },
    DealEnded {
        outcome: DealOutcome,
    },
    MatchWon {
        team: Team,
    },
}

#[derive(Debug)]
struct MatchHandle {
    state: Mutex<MatchState>,
    events: Broadcaster<MatchEvent>,
}

impl MatchHandle {
    /// Locks the match for one action. A match closed after the caller
    /// looked it up is reported as unknown before anything changes.
    fn lock_open(&self, id: &str) -> Result<MutexGuard<'_, MatchState>, CoordinatorError> {
        let state = self.state.lock();
        if self.events.is_closed() {
            return Err(CoordinatorError::UnknownMatch(id.to_string()));
        }
        Ok(state)
    }
}

#[derive(Debug, Default)]
pub struct MatchCoordinator {
    matches: RwLock<HashMap<String, Arc<MatchHandle>>>,
}

impl MatchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_match(
        &self,
        id: impl Into<String>,
        rules: RuleConfig,
        starting_player: PlayerPosition,
        seed: u64,
    ) -> Result<(), CoordinatorError> {
        let id = id.into();
        let state = MatchState::with_seed(rules, starting_player, seed)?;
        let mut matches = self.matches.write();
        if matches.contains_key(&id) {
            return Err(CoordinatorError::DuplicateMatch(id));
        }
        info!(match_id = %id, seed, "match created");
        matches.insert(
            id,
            Arc::new(MatchHandle {
                state: Mutex::new(state),
                events: Broadcaster::new(),
            }),
        );
        Ok(())
    }

    /// Resumes a match from a snapshot under a new id.
    pub fn restore_match(
        &self,
        id: impl Into<String>,
        snapshot: MatchSnapshot,
    ) -> Result<(), CoordinatorError> {
        let id = id.into();
        let state = snapshot.restore()?;
        let mut matches = self.matches.write();
        if matches.contains_key(&id) {
            return Err(CoordinatorError::DuplicateMatch(id));
        }
        info!(match_id = %id, deal = state.deal_number(), "match restored");
        matches.insert(
            id,
            Arc::new(MatchHandle {
                state: Mutex::new(state),
                events: Broadcaster::new(),
            }),
        );
        Ok(())
    }

    pub fn match_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.matches.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn subscribe(&self, id: &str) -> Result<Subscription<MatchEvent>, CoordinatorError> {
        Ok(self.handle(id)?.events.subscribe())
    }

    pub fn declare(
        &self,
        id: &str,
        seat: PlayerPosition,
        trump_suit: Suit,
    ) -> Result<(), CoordinatorError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock_open(id)?;
        state.round_mut().declare(seat, trump_suit)?;
        handle
            .events
            .publish(MatchEvent::Declared { seat, trump_suit })?;
        Ok(())
    }

    pub fn bury(
        &self,
        id: &str,
        seat: PlayerPosition,
        card_ids: &[CardId],
    ) -> Result<(), CoordinatorError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock_open(id)?;
        state.round_mut().bury(seat, card_ids)?;
        handle.events.publish(MatchEvent::KittyBuried { seat })?;
        Ok(())
    }

    pub fn play(
        &self,
        id: &str,
        seat: PlayerPosition,
        card_ids: &[CardId],
    ) -> Result<PlayOutcome, CoordinatorError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock_open(id)?;
        let round = state.round_mut();
        let cards: Vec<Card> = card_ids
            .iter()
            .filter_map(|card_id| round.hand(seat).find(*card_id))
            .collect();
        let outcome = round.play(seat, card_ids).inspect_err(|error| {
            if let Some(failure) = error.legality() {
                debug!(match_id = id, %seat, title = %failure.title, "play rejected");
            }
        })?;
        handle.events.publish(MatchEvent::Played {
            seat,
            cards,
            outcome,
        })?;
        Ok(outcome)
    }

    pub fn end_deal(&self, id: &str) -> Result<DealOutcome, CoordinatorError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock_open(id)?;
        let outcome = state.end_deal()?;
        handle.events.publish(MatchEvent::DealEnded {
            outcome: outcome.clone(),
        })?;
        if let Some(team) = outcome.match_winner {
            info!(match_id = id, winners = %team, "match won");
            handle.events.publish(MatchEvent::MatchWon { team })?;
        }
        Ok(outcome)
    }

    pub fn view(&self, id: &str, seat: PlayerPosition) -> Result<PlayerView, CoordinatorError> {
        let handle = self.handle(id)?;
        let state = handle.state.lock();
        Ok(PlayerView::project(id, &state, seat))
    }

    pub fn snapshot(&self, id: &str) -> Result<MatchSnapshot, CoordinatorError> {
        let handle = self.handle(id)?;
        let state = handle.state.lock();
        Ok(MatchSnapshot::capture(&state))
    }

    /// Removes the match and ends every subscriber's stream.
    pub fn close_match(&self, id: &str) -> Result<(), CoordinatorError> {
        let handle = self
            .matches
            .write()
            .remove(id)
            .ok_or_else(|| CoordinatorError::UnknownMatch(id.to_string()))?;
        let _state = handle.state.lock();
        handle.events.close();
        info!(match_id = id, "match closed");
        Ok(())
    }

    fn handle(&self, id: &str) -> Result<Arc<MatchHandle>, CoordinatorError> {
        self.matches
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownMatch(id.to_string()))
    }
}
