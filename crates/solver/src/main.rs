use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solver::config::CliOverrides;
use solver::pipeline::{self, SolveArgs, SummaryArgs};

/// tot-solve: tree-of-thought search with multi-attempt consensus.
#[derive(Parser)]
#[command(name = "tot-solve", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands for solving puzzles and inspecting run reports.
#[derive(Subcommand)]
enum Command {
    /// Solve one puzzle with several independent search attempts.
    Solve {
        /// Comma-separated starting numbers (e.g. 4,9,10,13).
        #[arg(long, value_delimiter = ',', required = true)]
        numbers: Vec<String>,
        /// Target value to reach.
        #[arg(long, default_value = "24")]
        target: String,
        /// Path to solve config TOML file (default: configs/solve.toml if present).
        #[arg(long)]
        config: Option<PathBuf>,
        /// URL of the OpenAI-compatible oracle server (e.g., http://localhost:30000).
        #[arg(long)]
        server_url: Option<String>,
        /// Override the number of independent attempts.
        #[arg(long)]
        attempts: Option<usize>,
        /// Override the number of attempts run in parallel.
        #[arg(long)]
        concurrency: Option<usize>,
        /// Path to write the JSON run report.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print statistics from a JSON run report.
    Summary {
        /// Path to the run report.
        #[arg(long)]
        input: PathBuf,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Solve {
            numbers,
            target,
            config,
            server_url,
            attempts,
            concurrency,
            output,
        } => {
            pipeline::run_solve(SolveArgs {
                numbers,
                target,
                config,
                overrides: CliOverrides {
                    server_url,
                    attempts,
                    concurrency,
                },
                output,
            })
            .await
        }
        Command::Summary { input, json } => pipeline::run_summary(SummaryArgs { input, json }),
    }
}
