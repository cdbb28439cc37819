use crate::state::{PuzzleState, Thought};
use crate::types::PuzzleError;

/// Per-puzzle rules the search engine depends on.
///
/// Sync trait: rule checks are cheap and never suspend. Implementations must
/// tolerate concurrent calls from independent attempts.
pub trait LegalityChecker: Send + Sync {
    /// Human-readable problem statement, rendered into oracle prompts.
    fn describe(&self) -> String;

    /// Whether `thought` is a legal transformation of `state`.
    fn is_legal(&self, state: &PuzzleState, thought: &Thought) -> Result<bool, PuzzleError>;

    /// Whether `state` solves the puzzle.
    fn is_terminal(&self, state: &PuzzleState) -> Result<bool, PuzzleError>;

    /// Final answer of a terminal state.
    fn extract_answer(&self, state: &PuzzleState) -> Result<String, PuzzleError>;
}
