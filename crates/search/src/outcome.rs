//! What one search attempt produced.

use std::fmt;

use puzzle::Thought;
use serde::{Deserialize, Serialize};

/// A solved path from the initial state to a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Thoughts applied from root to the terminal state.
    pub path: Vec<Thought>,
    /// Final answer as reported by the legality checker.
    pub answer: String,
    /// Minimum step score along `path`.
    pub path_score: f64,
}

/// Why an attempt ended without a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// Every branch was pruned or dead-ended.
    FrontierEmpty,
    /// Remaining states were all at the depth limit.
    DepthLimit,
    /// `max_expansions` states were expanded.
    ExpansionBudget,
    /// The per-attempt time budget ran out.
    Timeout,
}

impl fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExhaustReason::FrontierEmpty => "frontier empty",
            ExhaustReason::DepthLimit => "depth limit",
            ExhaustReason::ExpansionBudget => "expansion budget",
            ExhaustReason::Timeout => "timeout",
        };
        f.write_str(text)
    }
}

/// Terminal report of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Solved(Solution),
    /// Budget or frontier ran out. A normal outcome, not an error.
    Exhausted(ExhaustReason),
    /// Unrecoverable failure (e.g. the legality checker errored).
    Failed(String),
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Solved(_) => "solved",
            Outcome::Exhausted(_) => "exhausted",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Detailed statistics from a single search attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// States removed from the frontier and expanded.
    pub nodes_expanded: u32,
    /// Total states created, root included.
    pub total_states: u32,
    /// Deepest state created.
    pub max_depth_reached: u32,
    /// Oracle propose calls issued.
    pub propose_calls: u32,
    /// Propose calls that returned an error.
    pub propose_failures: u32,
    /// Proposals missing `THOUGHT:`/`REMAINING:` or with unparsable operands.
    pub malformed_proposals: u32,
    /// Well-formed proposals the legality checker rejected.
    pub illegal_proposals: u32,
    /// Oracle critique calls issued.
    pub critique_calls: u32,
    /// Critique calls that returned an error.
    pub critique_failures: u32,
    /// Thoughts dropped for scoring below threshold or an unparsable score.
    pub thoughts_pruned: u32,
    /// Expanded states that produced no surviving child.
    pub dead_ends: u32,
    /// States popped at the depth limit and not expanded.
    pub depth_limited: u32,
    /// Maximum size of the frontier during search.
    pub peak_frontier_size: usize,
    /// Wall-clock time of the attempt in milliseconds.
    pub wall_time_ms: u64,
}

/// Read-only snapshot of one tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub index: usize,
    pub parent: Option<usize>,
    pub depth: u32,
    pub remaining: Vec<String>,
    /// Thought that produced this node, `None` for root.
    pub thought: Option<String>,
    pub step_score: f64,
    pub path_score: f64,
}

/// Result of one search attempt.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub outcome: Outcome,
    pub stats: SearchStats,
    /// Every node created, in arena order.
    pub records: Vec<NodeRecord>,
}
