use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use shengji_core::game::match_state::{DealOutcome, MatchError, MatchState};
use shengji_core::model::legality::LegalityFailure;
use shengji_core::model::player::Team;
use shengji_core::model::round::{DealError, PlayError};
use thiserror::Error;
use tracing::{info, warn};

use crate::actions::{Action, ActionLogError, LoggedAction, load_actions};
use crate::config::{ReplayConfig, ResolvedPaths};
use crate::logging::telemetry_path;

/// Applies a recorded action log to a seeded match.
pub struct ReplayRunner {
    config: ReplayConfig,
    paths: ResolvedPaths,
    actions: Vec<LoggedAction>,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub actions_applied: usize,
    pub deals_completed: usize,
    pub rows_written: usize,
    pub levels: [u8; 4],
    pub match_winner: Option<Team>,
    /// The first rejected action; nothing after it was applied.
    pub failure: Option<ReplayFailure>,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFailure {
    pub line: usize,
    pub action: Action,
    pub reason: String,
    pub legality: Option<LegalityFailure>,
}

#[derive(Debug, Serialize)]
struct DealRow<'a> {
    run_id: &'a str,
    seed: u64,
    #[serde(flatten)]
    outcome: &'a DealOutcome,
}

impl ReplayRunner {
    /// Loads the action log named by a validated configuration.
    pub fn new(config: ReplayConfig, paths: ResolvedPaths) -> Result<Self, ReplayError> {
        let actions = load_actions(&paths.actions)?;
        Ok(Self {
            config,
            paths,
            actions,
        })
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Replays every action, streaming one JSONL row per finished deal.
    pub fn run(&self) -> Result<RunSummary, ReplayError> {
        ensure_parent(self.paths.jsonl.parent())?;
        ensure_parent(self.paths.summary_md.parent())?;

        let mut state = MatchState::with_seed(
            self.config.rules.clone(),
            self.config.starting_player,
            self.config.seed,
        )?;
        let mut writer = BufWriter::new(File::create(&self.paths.jsonl)?);
        let mut outcomes = Vec::new();
        let mut actions_applied = 0usize;
        let mut failure = None;

        for logged in &self.actions {
            match apply(&mut state, &logged.action) {
                Ok(Some(outcome)) => {
                    let row = DealRow {
                        run_id: &self.config.run_id,
                        seed: self.config.seed,
                        outcome: &outcome,
                    };
                    serde_json::to_writer(&mut writer, &row)?;
                    writer.write_all(b"\n")?;
                    outcomes.push(outcome);
                }
                Ok(None) => {}
                Err(rejection) => {
                    warn!(
                        line = logged.line,
                        reason = %rejection,
                        "replay stopped at rejected action"
                    );
                    failure = Some(ReplayFailure {
                        line: logged.line,
                        action: logged.action.clone(),
                        reason: rejection.to_string(),
                        legality: rejection.legality().cloned(),
                    });
                    break;
                }
            }
            actions_applied += 1;
        }
        writer.flush()?;

        let summary = RunSummary {
            actions_applied,
            deals_completed: outcomes.len(),
            rows_written: outcomes.len(),
            levels: *state.levels().levels(),
            match_winner: state.winner(),
            failure,
            jsonl_path: self.paths.jsonl.clone(),
            summary_path: self.paths.summary_md.clone(),
            telemetry_path: self
                .config
                .logging
                .enable_structured
                .then(|| telemetry_path(&self.paths)),
        };
        write_markdown(&self.paths.summary_md, &self.config, &outcomes, &summary)?;
        info!(
            run_id = %self.config.run_id,
            actions = actions_applied,
            deals = summary.deals_completed,
            rejected = summary.failure.is_some(),
            "replay finished"
        );
        Ok(summary)
    }
}

/// Why the engine refused an action.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error(transparent)]
    Deal(#[from] DealError),
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

impl Rejection {
    pub fn legality(&self) -> Option<&LegalityFailure> {
        match self {
            Rejection::Play(error) => error.legality(),
            _ => None,
        }
    }
}

fn apply(state: &mut MatchState, action: &Action) -> Result<Option<DealOutcome>, Rejection> {
    match action {
        Action::Declare { seat, suit } => state.round_mut().declare(*seat, *suit)?,
        Action::Bury { seat, cards } => state.round_mut().bury(*seat, cards)?,
        Action::Play { seat, cards } => {
            state.round_mut().play(*seat, cards)?;
        }
        Action::EndDeal => return Ok(Some(state.end_deal()?)),
    }
    Ok(None)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), ReplayError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_markdown(
    path: &Path,
    config: &ReplayConfig,
    outcomes: &[DealOutcome],
    summary: &RunSummary,
) -> Result<(), ReplayError> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# Replay `{}`", config.run_id)?;
    writeln!(out)?;
    writeln!(
        out,
        "Seed {} · trump rank {} · {} actions applied",
        config.seed,
        config.rules.trump_rank.as_str(),
        summary.actions_applied
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "| Deal | Declarer | Attacker score | Kitty bonus | Winners | Levels (N/E/S/W) |"
    )?;
    writeln!(out, "|---:|---|---:|---:|---|---|")?;
    for outcome in outcomes {
        let settlement = &outcome.settlement;
        let levels = outcome.levels;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} +{} | {}/{}/{}/{} |",
            outcome.deal_number,
            settlement.declarer,
            settlement.attacker_score,
            settlement.kitty_bonus,
            outcome.winning_team,
            outcome.promotion.levels,
            levels[0],
            levels[1],
            levels[2],
            levels[3],
        )?;
    }

    if let Some(team) = summary.match_winner {
        writeln!(out)?;
        writeln!(out, "Match won by {team}.")?;
    }

    if let Some(failure) = &summary.failure {
        writeln!(out)?;
        writeln!(out, "## Rejected action (line {})", failure.line)?;
        writeln!(out)?;
        writeln!(out, "{}", failure.reason)?;
        if let Some(legality) = &failure.legality {
            let hint: Vec<String> = legality.hint.iter().map(|card| card.to_string()).collect();
            writeln!(out)?;
            writeln!(out, "Suggested cards: {}", hint.join(", "))?;
        }
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize deal row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Actions(#[from] ActionLogError),
    #[error("match could not start: {0}")]
    Match(#[from] MatchError),
}
