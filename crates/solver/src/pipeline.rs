//! Solve pipeline and report utilities.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use consensus::{aggregate, Attempt, AttemptRunner, ConsensusResult};
use oracle::{ChatClient, OracleHandle, PromptSet};
use puzzle::{Game24, LegalityChecker, PuzzleState, Value};
use search::Oracle;

use crate::config::{apply_overrides, load_or_default, CliOverrides};
use crate::results::RunReport;

/// Arguments for the `solve` subcommand.
#[derive(Debug)]
pub struct SolveArgs {
    /// Initial operands.
    pub numbers: Vec<String>,
    /// Target value.
    pub target: String,
    /// Optional path to the solve config TOML file.
    pub config: Option<PathBuf>,
    /// CLI overrides for TOML values.
    pub overrides: CliOverrides,
    /// Optional path to write the JSON run report.
    pub output: Option<PathBuf>,
}

/// Arguments for the `summary` subcommand.
#[derive(Debug)]
pub struct SummaryArgs {
    /// Path to a JSON run report.
    pub input: PathBuf,
    /// Output as JSON instead of human-readable text.
    pub json: bool,
}

/// Solve one puzzle with N attempts and print the consensus block.
pub async fn run_solve(args: SolveArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load config
    let mut toml = load_or_default(args.config.as_deref())?;
    apply_overrides(&mut toml, &args.overrides);

    // 2. Validate puzzle and parameters before touching the network
    let initial = PuzzleState::parse(&args.numbers)?;
    let target = Value::parse(&args.target)?;
    let runner = AttemptRunner::from_configs(toml.search, toml.attempts)?;
    tracing::info!(
        numbers = ?args.numbers,
        target = %target,
        attempts = runner.config().attempt_count,
        "Starting solve"
    );

    // 3. Connect to the oracle server
    let client = ChatClient::new(toml.oracle).await?;
    let handle = OracleHandle::new(client);
    let prompts = Arc::new(handle.prompts().clone());
    let oracle: Arc<dyn Oracle> = Arc::new(handle);
    let checker: Arc<dyn LegalityChecker> = Arc::new(Game24::new(target));

    // 4. Run attempts with progress bar
    let pb = ProgressBar::new(runner.config().attempt_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    let (attempts, consensus) = solve_with(&runner, oracle, checker, prompts, &initial, &pb).await;
    pb.finish_with_message("done");

    // 5. Print consensus
    println!("\n{}", consensus.render());

    // 6. Write report
    let report = RunReport::new(
        args.numbers,
        args.target,
        &attempts,
        &consensus,
        start.elapsed().as_secs_f64(),
    );
    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Wrote run report");
    }

    // 7. Print summary
    let summary = report.summarize();
    println!("\n--- Solve Summary ---");
    println!(
        "Solved: {}/{} (exhausted {}, failed {})",
        summary.solved, summary.total_attempts, summary.exhausted, summary.failed
    );
    println!("Median attempt: {:.1}s", summary.median_attempt_secs);
    if let Some(path) = &args.output {
        println!("Report: {}", path.display());
    }
    println!("Elapsed: {:.1}s", summary.wall_time_secs);

    Ok(())
}

/// Run every attempt, ticking `pb` as each finishes, then aggregate.
pub async fn solve_with(
    runner: &AttemptRunner,
    oracle: Arc<dyn Oracle>,
    checker: Arc<dyn LegalityChecker>,
    prompts: Arc<PromptSet>,
    initial: &PuzzleState,
    pb: &ProgressBar,
) -> (Vec<Attempt>, ConsensusResult) {
    let mut solved = 0usize;
    let attempts = runner
        .run_all_with(oracle, checker, prompts, initial, |attempt| {
            if attempt.outcome.is_solved() {
                solved += 1;
            }
            pb.inc(1);
            pb.set_message(format!("{solved} solved"));
        })
        .await;
    let consensus = aggregate(&attempts);
    (attempts, consensus)
}

/// Print statistics from a saved run report.
pub fn run_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&args.input)
        .map_err(|e| anyhow::anyhow!("Failed to read report {}: {e}", args.input.display()))?;
    let report: RunReport = serde_json::from_str(&contents)?;
    let summary = report.summarize();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("--- Run Summary ---");
    println!("File: {}", args.input.display());
    println!("Puzzle: [{}] -> {}", report.numbers.join(", "), report.target);
    println!("Attempts: {}", summary.total_attempts);
    println!("Solved: {}", summary.solved);
    println!("Exhausted: {}", summary.exhausted);
    println!("Failed: {}", summary.failed);
    println!(
        "Answer: {} (confidence {})",
        summary.answer.as_deref().unwrap_or("none"),
        summary.confidence
    );
    println!("Avg expansions: {:.1}", summary.avg_expansions);
    println!("Oracle calls: {}", summary.total_oracle_calls);
    println!("Median attempt: {:.1}s", summary.median_attempt_secs);
    println!("Wall time: {:.1}s", summary.wall_time_secs);

    Ok(())
}
