use crate::broadcast::BroadcastError;
use shengji_core::game::match_state::MatchError;
use shengji_core::model::legality::LegalityFailure;
use shengji_core::model::round::{DealError, PlayError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("no match with id `{0}`")]
    UnknownMatch(String),
    #[error("a match with id `{0}` already exists")]
    DuplicateMatch(String),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Deal(#[from] DealError),
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

impl CoordinatorError {
    /// The rules violation behind a rejected play, for surfacing to the
    /// player with its hint.
    pub fn legality(&self) -> Option<&LegalityFailure> {
        match self {
            CoordinatorError::Play(error) => error.legality(),
            _ => None,
        }
    }
}
