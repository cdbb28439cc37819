//! Runs independent search attempts and reduces their answers to one.
//!
//! [`AttemptRunner`] launches N isolated [`search::SearchEngine`] attempts
//! under a concurrency limit and per-attempt timeout. [`aggregate`] is a pure
//! majority vote over the solved attempts with a deterministic tie-break.

pub mod aggregate;
pub mod config;
pub mod runner;
pub mod types;

pub use aggregate::{aggregate, canonical_answer, AnswerKey};
pub use config::AttemptConfig;
pub use runner::AttemptRunner;
pub use types::{Attempt, ConsensusResult, RunError};
