//! "Reach the target" arithmetic puzzle (Game of 24 and its generalizations).

use crate::checker::LegalityChecker;
use crate::state::{same_multiset, PuzzleState, Thought};
use crate::types::{PuzzleError, Value};

/// Combine two operands per step with `+ - * /` until one operand equals the target.
#[derive(Debug, Clone, Copy)]
pub struct Game24 {
    target: Value,
}

impl Game24 {
    pub fn new(target: Value) -> Self {
        Self { target }
    }
}

impl Default for Game24 {
    fn default() -> Self {
        Self::new(Value::integer(24))
    }
}

/// Every value a single binary step can produce from `a` and `b`.
fn combinations(a: Value, b: Value) -> Vec<Value> {
    [
        a.checked_add(b),
        a.checked_sub(b),
        b.checked_sub(a),
        a.checked_mul(b),
        a.checked_div(b),
        b.checked_div(a),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl LegalityChecker for Game24 {
    fn describe(&self) -> String {
        format!(
            "Use every starting number exactly once with +, -, *, / to reach {}. \
             Each step combines exactly two of the remaining numbers into one.",
            self.target
        )
    }

    fn is_legal(&self, state: &PuzzleState, thought: &Thought) -> Result<bool, PuzzleError> {
        let parent = state.remaining();
        let proposed = &thought.resulting_remaining;
        if parent.len() < 2 || proposed.len() + 1 != parent.len() {
            return Ok(false);
        }

        for i in 0..parent.len() {
            for j in (i + 1)..parent.len() {
                let rest: Vec<Value> = parent
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| k != i && k != j)
                    .map(|(_, v)| *v)
                    .collect();
                for result in combinations(parent[i], parent[j]) {
                    let mut candidate = rest.clone();
                    candidate.push(result);
                    if same_multiset(&candidate, proposed) {
                        return Ok(true);
                    }
                }
            }
        }

        tracing::debug!(
            thought = %thought.description,
            "No operand pair produces the proposed remaining set"
        );
        Ok(false)
    }

    fn is_terminal(&self, state: &PuzzleState) -> Result<bool, PuzzleError> {
        Ok(matches!(state.remaining(), [only] if *only == self.target))
    }

    fn extract_answer(&self, state: &PuzzleState) -> Result<String, PuzzleError> {
        match state.remaining() {
            [only] if *only == self.target => Ok(only.to_string()),
            _ => Err(PuzzleError::NotTerminal(format!(
                "[{}]",
                state.remaining_text().join(", ")
            ))),
        }
    }
}
