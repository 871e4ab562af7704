use crate::model::deck::CARDS_PER_DECK;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_DECKS: usize = 2;
const DEFAULT_KITTY_SIZE: usize = 8;
const DEFAULT_STARTING_LEVEL: u8 = 2;
const DEFAULT_MAX_LEVEL: u8 = 14;

/// Table rules for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_trump_rank")]
    pub trump_rank: Rank,
    #[serde(default = "default_decks")]
    pub decks: usize,
    #[serde(default = "default_kitty_size")]
    pub kitty_size: usize,
    #[serde(default = "default_starting_level")]
    pub starting_level: u8,
    /// Levels are clamped here; a team whose members both reach it wins.
    #[serde(default = "default_max_level")]
    pub max_level: u8,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            trump_rank: default_trump_rank(),
            decks: default_decks(),
            kitty_size: default_kitty_size(),
            starting_level: default_starting_level(),
            max_level: default_max_level(),
        }
    }
}

impl RuleConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.trump_rank.is_joker() {
            return Err(RuleError::InvalidField {
                field: "trump_rank",
                message: "trump rank must be an ordinary rank".to_string(),
            });
        }

        if self.decks == 0 {
            return Err(RuleError::InvalidField {
                field: "decks",
                message: "at least one deck is required".to_string(),
            });
        }

        let cards = self.decks * CARDS_PER_DECK;
        if self.kitty_size == 0 || self.kitty_size >= cards {
            return Err(RuleError::InvalidField {
                field: "kitty_size",
                message: format!("kitty must hold between 1 and {} cards", cards - 1),
            });
        }

        if (cards - self.kitty_size) % 4 != 0 {
            return Err(RuleError::InvalidField {
                field: "kitty_size",
                message: format!(
                    "{} cards minus a kitty of {} cannot be dealt evenly to four players",
                    cards, self.kitty_size
                ),
            });
        }

        if self.starting_level > self.max_level {
            return Err(RuleError::InvalidField {
                field: "starting_level",
                message: format!(
                    "starting level {} is above the maximum level {}",
                    self.starting_level, self.max_level
                ),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("invalid value for `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

fn default_trump_rank() -> Rank {
    Rank::Two
}

fn default_decks() -> usize {
    DEFAULT_DECKS
}

fn default_kitty_size() -> usize {
    DEFAULT_KITTY_SIZE
}

fn default_starting_level() -> u8 {
    DEFAULT_STARTING_LEVEL
}

fn default_max_level() -> u8 {
    DEFAULT_MAX_LEVEL
}
