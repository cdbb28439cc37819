//! Result types for solve runs and report summaries.

use consensus::{Attempt, ConsensusResult};
use search::{Outcome, SearchStats};
use serde::{Deserialize, Serialize};

/// Everything one `tot-solve solve` run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Initial operands as given on the command line.
    pub numbers: Vec<String>,
    /// Target value.
    pub target: String,
    /// Per-attempt results, ordered by attempt id.
    pub attempts: Vec<AttemptSummary>,
    /// Aggregated answer.
    pub consensus: ConsensusSummary,
    /// Wall-clock time for the whole run in seconds.
    pub wall_time_secs: f64,
    /// Median wall-clock time per attempt in seconds.
    pub median_attempt_secs: f64,
}

/// Result for a single attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub id: usize,
    /// "solved", "exhausted", or "failed".
    pub outcome: String,
    /// Exhaust reason or failure cause; empty when solved.
    #[serde(default)]
    pub detail: String,
    pub answer: Option<String>,
    /// Thought descriptions from root to the solution (empty unless solved).
    #[serde(default)]
    pub path: Vec<String>,
    pub path_score: Option<f64>,
    /// Wall-clock time in seconds.
    pub time_secs: f64,
    pub stats: SearchStats,
}

impl From<&Attempt> for AttemptSummary {
    fn from(attempt: &Attempt) -> Self {
        let (detail, path) = match &attempt.outcome {
            Outcome::Solved(solution) => (
                String::new(),
                solution.path.iter().map(|t| t.description.clone()).collect(),
            ),
            Outcome::Exhausted(reason) => (reason.to_string(), Vec::new()),
            Outcome::Failed(cause) => (cause.clone(), Vec::new()),
        };
        Self {
            id: attempt.id,
            outcome: attempt.outcome.label().to_string(),
            detail,
            answer: attempt.answer().map(str::to_string),
            path,
            path_score: attempt.path_score(),
            time_secs: attempt.stats.wall_time_ms as f64 / 1000.0,
            stats: attempt.stats.clone(),
        }
    }
}

/// Serialized form of a [`ConsensusResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusSummary {
    pub answer: Option<String>,
    pub agreeing: usize,
    /// Denominator of the confidence fraction.
    pub confidence_of: usize,
    pub confidence: f64,
    pub reasoning: String,
    pub winning_attempt: Option<usize>,
    /// The `CONSENSUS_ANSWER` / `CONFIDENCE` / `REASONING` block.
    pub rendered: String,
}

impl From<&ConsensusResult> for ConsensusSummary {
    fn from(result: &ConsensusResult) -> Self {
        let (agreeing, confidence_of) = result.confidence_parts();
        Self {
            answer: result.answer.clone(),
            agreeing,
            confidence_of,
            confidence: result.confidence(),
            reasoning: result.reasoning.clone(),
            winning_attempt: result.winning_attempt,
            rendered: result.render(),
        }
    }
}

/// Aggregate statistics printed by `tot-solve summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_attempts: usize,
    pub solved: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub answer: Option<String>,
    /// `k/n` confidence string.
    pub confidence: String,
    pub wall_time_secs: f64,
    pub median_attempt_secs: f64,
    pub avg_expansions: f64,
    pub total_oracle_calls: u64,
}

impl RunReport {
    pub fn new(
        numbers: Vec<String>,
        target: String,
        attempts: &[Attempt],
        consensus: &ConsensusResult,
        wall_time_secs: f64,
    ) -> Self {
        let attempts: Vec<AttemptSummary> = attempts.iter().map(AttemptSummary::from).collect();
        let mut times: Vec<f64> = attempts.iter().map(|a| a.time_secs).collect();
        Self {
            numbers,
            target,
            median_attempt_secs: median(&mut times),
            attempts,
            consensus: ConsensusSummary::from(consensus),
            wall_time_secs,
        }
    }

    pub fn summarize(&self) -> ReportSummary {
        let count = |label: &str| self.attempts.iter().filter(|a| a.outcome == label).count();
        let total = self.attempts.len();
        let expansions: u64 = self.attempts.iter().map(|a| a.stats.nodes_expanded as u64).sum();
        let oracle_calls: u64 = self
            .attempts
            .iter()
            .map(|a| a.stats.propose_calls as u64 + a.stats.critique_calls as u64)
            .sum();
        ReportSummary {
            total_attempts: total,
            solved: count("solved"),
            exhausted: count("exhausted"),
            failed: count("failed"),
            answer: self.consensus.answer.clone(),
            confidence: format!("{}/{}", self.consensus.agreeing, self.consensus.confidence_of),
            wall_time_secs: self.wall_time_secs,
            median_attempt_secs: self.median_attempt_secs,
            avg_expansions: if total > 0 {
                expansions as f64 / total as f64
            } else {
                0.0
            },
            total_oracle_calls: oracle_calls,
        }
    }
}

/// Compute the median of a slice of f64 values.
///
/// Returns 0.0 for empty slices.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
