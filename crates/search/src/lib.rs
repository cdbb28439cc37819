//! Best-first thought search with an external scoring oracle.
//!
//! One [`SearchEngine::run`] call explores one tree: it asks the oracle for
//! candidate thoughts, drops the illegal ones, has the oracle critique the
//! rest, prunes anything below the score threshold, and expands survivors in
//! order of their weakest-link path score. Trait-based seams keep the loop
//! testable with mocks (no model, no network).
//!
//! # Key types
//!
//! - [`SearchEngine`]: the search driver
//! - [`SearchConfig`]: branching, pruning, and budget parameters (TOML)
//! - [`Oracle`]: textual propose/critique capability
//! - [`SearchNode`] / [`ScoredNode`]: tree nodes and frontier entries
//! - [`SearchResult`] / [`Outcome`]: what one attempt produced

pub mod adapters;
pub mod config;
pub mod engine;
pub mod mocks;
pub mod node;
pub mod outcome;

pub use config::SearchConfig;
pub use engine::{Oracle, SearchEngine, SearchError};
pub use node::{ScoredNode, SearchNode};
pub use outcome::{ExhaustReason, NodeRecord, Outcome, SearchResult, SearchStats, Solution};
