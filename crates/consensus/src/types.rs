use search::{Outcome, SearchError, SearchStats};

/// Errors raised before any attempt runs.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Attempt parameters the runner cannot work with.
    #[error("Invalid attempt config: {0}")]
    InvalidConfig(String),
    /// Search engine construction failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// One independent search attempt and how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Ordinal among the N attempts (0-based).
    pub id: usize,
    pub outcome: Outcome,
    pub stats: SearchStats,
}

impl Attempt {
    /// Final answer, if the attempt solved the puzzle.
    pub fn answer(&self) -> Option<&str> {
        self.outcome.solution().map(|s| s.answer.as_str())
    }

    pub fn path_score(&self) -> Option<f64> {
        self.outcome.solution().map(|s| s.path_score)
    }
}

/// Majority answer across attempts.
///
/// Derived fresh from a finished attempt list; `answer` is `None` when no
/// attempt solved the puzzle.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusResult {
    pub answer: Option<String>,
    /// Solved attempts whose answer matches `answer`.
    pub agreeing: usize,
    /// Attempts that ended `Solved`.
    pub solved: usize,
    /// All attempts, including exhausted and failed ones.
    pub total_attempts: usize,
    pub reasoning: String,
    /// Attempt whose path represents the winning answer.
    pub winning_attempt: Option<usize>,
}

impl ConsensusResult {
    pub fn has_consensus(&self) -> bool {
        self.answer.is_some()
    }

    /// `(agreeing, solved)`, or `(0, total_attempts)` with no consensus.
    pub fn confidence_parts(&self) -> (usize, usize) {
        if self.has_consensus() {
            (self.agreeing, self.solved)
        } else {
            (0, self.total_attempts)
        }
    }

    /// Confidence as a fraction in [0, 1].
    pub fn confidence(&self) -> f64 {
        match self.confidence_parts() {
            (_, 0) => 0.0,
            (k, n) => k as f64 / n as f64,
        }
    }

    /// Report block with `CONSENSUS_ANSWER:`, `CONFIDENCE: k/n` and `REASONING:` lines.
    pub fn render(&self) -> String {
        let (k, n) = self.confidence_parts();
        format!(
            "CONSENSUS_ANSWER: {}\nCONFIDENCE: {k}/{n}\nREASONING: {}",
            self.answer.as_deref().unwrap_or("none"),
            self.reasoning
        )
    }
}
