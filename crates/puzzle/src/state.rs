use crate::types::{PuzzleError, Value};

/// One proposed, atomic transformation of a puzzle state.
///
/// `resulting_remaining` is what the proposer *claims* the operand set becomes;
/// it is only trusted after a [`LegalityChecker`](crate::LegalityChecker) accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thought {
    /// Free-form text naming the operation (e.g. `"8 - 3 = 5"`).
    pub description: String,
    /// Operand set proposed after this step.
    pub resulting_remaining: Vec<Value>,
}

impl Thought {
    pub fn new(description: impl Into<String>, resulting_remaining: Vec<Value>) -> Self {
        Self {
            description: description.into(),
            resulting_remaining,
        }
    }
}

/// A node in the search tree: remaining operands plus the path that produced them.
///
/// States are never mutated; [`PuzzleState::apply`] builds a new child.
#[derive(Debug, Clone)]
pub struct PuzzleState {
    remaining: Vec<Value>,
    history: Vec<Thought>,
}

impl PuzzleState {
    /// Root state for a puzzle. Rejects an empty operand set.
    pub fn new(operands: Vec<Value>) -> Result<Self, PuzzleError> {
        if operands.is_empty() {
            return Err(PuzzleError::EmptyOperands);
        }
        Ok(Self {
            remaining: operands,
            history: Vec::new(),
        })
    }

    /// Parse a root state from operand strings (e.g. CLI input).
    pub fn parse<S: AsRef<str>>(operands: &[S]) -> Result<Self, PuzzleError> {
        let values = operands
            .iter()
            .map(|s| Value::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(values)
    }

    pub fn remaining(&self) -> &[Value] {
        &self.remaining
    }

    pub fn history(&self) -> &[Thought] {
        &self.history
    }

    /// Number of thoughts applied from the root.
    pub fn depth(&self) -> u32 {
        self.history.len() as u32
    }

    /// Child state reached by applying `thought`. The parent is left untouched.
    ///
    /// Callers are expected to have validated the thought first.
    pub fn apply(&self, thought: Thought) -> PuzzleState {
        let mut history = self.history.clone();
        let remaining = thought.resulting_remaining.clone();
        history.push(thought);
        PuzzleState { remaining, history }
    }

    /// Operands rendered as text, in stored order.
    pub fn remaining_text(&self) -> Vec<String> {
        self.remaining.iter().map(Value::to_string).collect()
    }

    /// Thought descriptions from root to this state.
    pub fn history_text(&self) -> Vec<String> {
        self.history.iter().map(|t| t.description.clone()).collect()
    }
}

/// Equality ignores operand order but not history.
impl PartialEq for PuzzleState {
    fn eq(&self, other: &Self) -> bool {
        self.history == other.history && same_multiset(&self.remaining, &other.remaining)
    }
}

pub(crate) fn same_multiset(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}
