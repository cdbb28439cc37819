//! Puzzle domain model for test-time thought search.
//!
//! A puzzle is a multiset of operands that must be reduced to a target by a
//! sequence of reversible steps ("thoughts"). This crate owns the immutable
//! state representation and the legality contract the search engine relies on;
//! it knows nothing about language models.
//!
//! # Key types
//!
//! - [`Value`]: exact rational operand
//! - [`PuzzleState`] / [`Thought`]: search tree node contents and transitions
//! - [`LegalityChecker`]: per-puzzle rules (legal step, terminal state, answer)
//! - [`Game24`]: the "reach a target with + - * /" checker

pub mod checker;
pub mod expr;
pub mod game24;
pub mod state;
pub mod types;

pub use checker::LegalityChecker;
pub use expr::evaluate_expression;
pub use game24::Game24;
pub use state::{PuzzleState, Thought};
pub use types::{PuzzleError, Value};
