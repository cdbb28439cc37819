//! Language-model oracle boundary for thought search.
//!
//! The search engine treats the model as a black box that maps a rendered
//! prompt to free-form text. This crate owns both sides of that textual
//! contract: rendering prompts from puzzle context, talking to an
//! OpenAI-compatible chat server, and parsing replies back into structure.
//!
//! # Key types
//!
//! - [`PromptSet`] / [`PromptContext`]: immutable templates and rendered prompts
//! - [`parse_thought`] / [`parse_score`]: `THOUGHT:`/`REMAINING:` and `SCORE:`/`CRITIQUE:` parsers
//! - [`ChatClient`]: HTTP client with retry and circuit breaker
//! - [`OracleHandle`]: cloneable handle shared across concurrent attempts

pub mod client;
pub mod handle;
pub mod prompt;
pub mod types;

pub use client::ChatClient;
pub use handle::OracleHandle;
pub use prompt::{parse_score, parse_thought, PromptContext, PromptSet};
pub use types::{OracleConfig, ParsedScore, ParsedThought};
