use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use shengji_replay::config::ReplayConfig;
use shengji_replay::logging::init_logging;
use shengji_replay::runner::ReplayRunner;

/// Replays a recorded action log through the rules engine.
#[derive(Debug, Parser)]
#[command(
    name = "shengji-replay",
    author,
    version,
    about = "Deterministic Shengji action-log replay"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "replay/replay.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the RNG seed used to shuffle every deal.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the action log path.
    #[arg(long, value_name = "FILE")]
    actions: Option<String>,

    /// Exit after validating the configuration and action log.
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ReplayConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    if let Some(actions) = cli.actions {
        config.input.actions = actions;
    }

    config.validate()?;

    let paths = config.resolved_paths();
    let run_id = config.run_id.clone();
    let _logging_guard = init_logging(&config.logging, &paths)?;
    let runner = ReplayRunner::new(config, paths)?;

    println!(
        "Loaded replay '{run_id}' with {} action{}",
        runner.action_count(),
        if runner.action_count() == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: replay skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Replay complete for '{run_id}': {} actions → {} deals at {}",
        summary.actions_applied,
        summary.deals_completed,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(team) = summary.match_winner {
        println!("Match won by {team}");
    }

    if let Some(failure) = summary.failure {
        if let Some(legality) = failure.legality {
            let hint: Vec<String> = legality.hint.iter().map(|card| card.to_string()).collect();
            eprintln!("Hint: {}", hint.join(", "));
        }
        bail!("action on line {} rejected: {}", failure.line, failure.reason);
    }

    Ok(())
}
