//! The recorded action log: one JSON object per line.

use serde::{Deserialize, Serialize};
use shengji_core::model::card::CardId;
use shengji_core::model::player::PlayerPosition;
use shengji_core::model::suit::Suit;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Declare {
        seat: PlayerPosition,
        suit: Suit,
    },
    Bury {
        seat: PlayerPosition,
        cards: Vec<CardId>,
    },
    Play {
        seat: PlayerPosition,
        cards: Vec<CardId>,
    },
    EndDeal,
}

/// An action together with its 1-based line in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedAction {
    pub line: usize,
    pub action: Action,
}

#[derive(Debug, Error)]
pub enum ActionLogError {
    #[error("failed to read action log {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("{path:?} line {line}: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
        line: usize,
    },
}

/// Reads every action, skipping blank lines.
pub fn load_actions(path: &Path) -> Result<Vec<LoggedAction>, ActionLogError> {
    let read_error = |source| ActionLogError::Read {
        source,
        path: path.to_path_buf(),
    };
    let reader = BufReader::new(File::open(path).map_err(read_error)?);
    let mut actions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_text = line.map_err(read_error)?;
        if line_text.trim().is_empty() {
            continue;
        }
        let action =
            serde_json::from_str(&line_text).map_err(|source| ActionLogError::Parse {
                source,
                path: path.to_path_buf(),
                line: index + 1,
            })?;
        actions.push(LoggedAction {
            line: index + 1,
            action,
        });
    }
    Ok(actions)
}
