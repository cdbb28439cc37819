//! Best-first thought search: generate, validate, critique, prune, expand.

use std::collections::BinaryHeap;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use oracle::{parse_score, parse_thought, PromptContext, PromptSet};
use puzzle::{LegalityChecker, PuzzleError, PuzzleState, Thought, Value};

use crate::config::SearchConfig;
use crate::node::{ScoredNode, SearchNode};
use crate::outcome::{ExhaustReason, NodeRecord, Outcome, SearchResult, SearchStats, Solution};

/// Errors that can occur during thought search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Error from the oracle (transport, server, decoding).
    #[error("Oracle error: {0}")]
    Oracle(#[source] anyhow::Error),
    /// Error from the legality checker.
    #[error("Puzzle error: {0}")]
    Puzzle(#[from] PuzzleError),
    /// Search parameters the engine cannot run with.
    #[error("Invalid search config: {0}")]
    InvalidConfig(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Language-model oracle that proposes and critiques thoughts.
///
/// Each call is an independent sample: identical contexts may return
/// different text. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// One free-form proposal (`THOUGHT:` / `REMAINING:` lines expected).
    async fn propose(&self, context: &PromptContext) -> Result<String, SearchError>;

    /// One free-form critique (`SCORE:` / `CRITIQUE:` lines expected).
    async fn critique(&self, context: &PromptContext) -> Result<String, SearchError>;
}

// ---------------------------------------------------------------------------
// SearchEngine
// ---------------------------------------------------------------------------

/// Best-first thought search engine.
///
/// Expands states by path score (minimum critique score along the path),
/// generating candidate thoughts with the oracle and checking them against
/// the puzzle's legality rules before they are scored.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    /// Create a new search engine, rejecting invalid configuration.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Search parameters this engine was validated with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one independent search attempt from `initial`.
    ///
    /// Never returns an error: oracle failures discard single candidates,
    /// and checker failures end the attempt as [`Outcome::Failed`].
    pub async fn run(
        &self,
        oracle: &dyn Oracle,
        checker: &dyn LegalityChecker,
        prompts: &PromptSet,
        initial: &PuzzleState,
    ) -> SearchResult {
        let start_time = Instant::now();
        let mut stats = SearchStats::default();
        let problem = checker.describe();

        let root = SearchNode::root(initial.clone());
        stats.max_depth_reached = root.depth;
        let mut frontier = BinaryHeap::new();
        frontier.push(ScoredNode::new(0, &root));
        let mut arena = vec![root];
        stats.peak_frontier_size = 1;

        let outcome = loop {
            if stats.nodes_expanded >= self.config.max_expansions {
                break Outcome::Exhausted(ExhaustReason::ExpansionBudget);
            }

            let Some(current) = frontier.pop() else {
                let reason = if stats.depth_limited > 0 {
                    ExhaustReason::DepthLimit
                } else {
                    ExhaustReason::FrontierEmpty
                };
                break Outcome::Exhausted(reason);
            };

            let node_idx = current.node_index;
            match checker.is_terminal(&arena[node_idx].state) {
                Ok(true) => break solved(checker, &arena[node_idx]),
                Ok(false) => {}
                Err(e) => break checker_failure(e),
            }

            let node_depth = arena[node_idx].depth;
            // Children would exceed the limit; don't spend oracle calls on them.
            if node_depth >= self.config.max_depth {
                stats.depth_limited += 1;
                continue;
            }

            stats.nodes_expanded += 1;
            let parent_state = arena[node_idx].state.clone();
            tracing::debug!(
                node = node_idx,
                depth = node_depth,
                score = %current.score,
                remaining = ?parent_state.remaining_text(),
                "Expanding state"
            );

            let candidates = self
                .propose_candidates(oracle, prompts, &problem, &parent_state, &mut stats)
                .await;

            let mut legal = Vec::with_capacity(candidates.len());
            let mut failure = None;
            for thought in candidates {
                match checker.is_legal(&parent_state, &thought) {
                    Ok(true) => legal.push(thought),
                    Ok(false) => {
                        stats.illegal_proposals += 1;
                        tracing::debug!(thought = %thought.description, "Illegal thought discarded");
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                break checker_failure(e);
            }

            let scored = self
                .critique_candidates(oracle, prompts, &problem, &parent_state, legal, &mut stats)
                .await;

            let mut survivors = 0usize;
            let mut terminal = None;
            for (thought, score) in scored {
                if score < self.config.score_threshold {
                    stats.thoughts_pruned += 1;
                    tracing::debug!(
                        thought = %thought.description,
                        score,
                        threshold = self.config.score_threshold,
                        "Thought pruned"
                    );
                    continue;
                }
                survivors += 1;

                let child_state = parent_state.apply(thought);
                let child = SearchNode::child(&arena[node_idx], node_idx, child_state, score);
                stats.max_depth_reached = stats.max_depth_reached.max(child.depth);
                let child_idx = arena.len();

                match checker.is_terminal(&child.state) {
                    Ok(true) => {
                        arena.push(child);
                        terminal = Some(Ok(child_idx));
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        terminal = Some(Err(e));
                        break;
                    }
                }

                frontier.push(ScoredNode::new(child_idx, &child));
                arena.push(child);
                stats.peak_frontier_size = stats.peak_frontier_size.max(frontier.len());
            }

            match terminal {
                Some(Ok(idx)) => break solved(checker, &arena[idx]),
                Some(Err(e)) => break checker_failure(e),
                None => {}
            }

            if survivors == 0 {
                stats.dead_ends += 1;
                tracing::debug!(node = node_idx, "Dead end, no thought survived");
            }
        };

        stats.total_states = arena.len() as u32;
        stats.wall_time_ms = start_time.elapsed().as_millis() as u64;

        match &outcome {
            Outcome::Solved(solution) => tracing::info!(
                answer = %solution.answer,
                steps = solution.path.len(),
                path_score = solution.path_score,
                expansions = stats.nodes_expanded,
                states = stats.total_states,
                time_ms = stats.wall_time_ms,
                "Solution found"
            ),
            Outcome::Exhausted(reason) => tracing::info!(
                %reason,
                expansions = stats.nodes_expanded,
                states = stats.total_states,
                time_ms = stats.wall_time_ms,
                "Search exhausted without solution"
            ),
            Outcome::Failed(cause) => tracing::warn!(
                %cause,
                expansions = stats.nodes_expanded,
                "Search failed"
            ),
        }

        SearchResult {
            outcome,
            stats,
            records: build_records(&arena),
        }
    }

    /// Request `branch_factor` independent proposals and parse the usable ones.
    async fn propose_candidates(
        &self,
        oracle: &dyn Oracle,
        prompts: &PromptSet,
        problem: &str,
        state: &PuzzleState,
        stats: &mut SearchStats,
    ) -> Vec<Thought> {
        let context = prompts.propose_context(problem, &state.remaining_text(), &state.history_text());

        let calls: Vec<_> = (0..self.config.branch_factor)
            .map(|_| oracle.propose(&context))
            .collect();
        let responses: Vec<Result<String, SearchError>> = stream::iter(calls)
            .buffered(self.config.candidate_concurrency)
            .collect()
            .await;
        stats.propose_calls += responses.len() as u32;

        let mut thoughts = Vec::with_capacity(responses.len());
        for response in responses {
            let text = match response {
                Ok(text) => text,
                Err(e) => {
                    stats.propose_failures += 1;
                    tracing::debug!(error = %e, "Propose call failed, candidate skipped");
                    continue;
                }
            };
            match to_thought(&text) {
                Some(thought) => thoughts.push(thought),
                None => {
                    stats.malformed_proposals += 1;
                    let preview: String = text.chars().take(80).collect();
                    tracing::debug!(output = %preview, "Malformed proposal discarded");
                }
            }
        }
        thoughts
    }

    /// Critique every legal thought; returns those with a usable score.
    async fn critique_candidates(
        &self,
        oracle: &dyn Oracle,
        prompts: &PromptSet,
        problem: &str,
        state: &PuzzleState,
        thoughts: Vec<Thought>,
        stats: &mut SearchStats,
    ) -> Vec<(Thought, f64)> {
        if thoughts.is_empty() {
            return Vec::new();
        }

        let remaining = state.remaining_text();
        let history = state.history_text();
        let contexts: Vec<PromptContext> = thoughts
            .iter()
            .map(|t| {
                let proposed: Vec<String> = t.resulting_remaining.iter().map(Value::to_string).collect();
                prompts.critique_context(problem, &remaining, &history, &t.description, &proposed)
            })
            .collect();

        let calls: Vec<_> = contexts.iter().map(|context| oracle.critique(context)).collect();
        let responses: Vec<Result<String, SearchError>> = stream::iter(calls)
            .buffered(self.config.candidate_concurrency)
            .collect()
            .await;
        stats.critique_calls += responses.len() as u32;

        let mut scored = Vec::with_capacity(thoughts.len());
        for (thought, response) in thoughts.into_iter().zip(responses) {
            let text = match response {
                Ok(text) => text,
                Err(e) => {
                    stats.critique_failures += 1;
                    tracing::debug!(thought = %thought.description, error = %e, "Critique call failed, candidate skipped");
                    continue;
                }
            };
            match parse_score(&text) {
                Some(score) => {
                    if score.clamped {
                        tracing::warn!(thought = %thought.description, score = score.value, "Critique score out of range, clamped");
                    }
                    scored.push((thought, score.value));
                }
                None => {
                    // Unusable score fails the threshold.
                    stats.thoughts_pruned += 1;
                    tracing::debug!(thought = %thought.description, "Unparsable critique score, thought pruned");
                }
            }
        }
        scored
    }
}

/// Parse oracle text into a thought; `None` if malformed or any operand is unparsable.
fn to_thought(text: &str) -> Option<Thought> {
    let parsed = parse_thought(text)?;
    let values = parsed
        .remaining
        .iter()
        .map(|token| Value::parse(token))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some(Thought::new(parsed.description, values))
}

fn solved(checker: &dyn LegalityChecker, node: &SearchNode) -> Outcome {
    match checker.extract_answer(&node.state) {
        Ok(answer) => Outcome::Solved(Solution {
            path: node.state.history().to_vec(),
            answer,
            path_score: node.path_score,
        }),
        Err(e) => checker_failure(e),
    }
}

fn checker_failure(e: PuzzleError) -> Outcome {
    let err = SearchError::from(e);
    tracing::warn!(error = %err, "Legality checker failed, aborting attempt");
    Outcome::Failed(err.to_string())
}

/// Snapshot the arena for inspection.
fn build_records(arena: &[SearchNode]) -> Vec<NodeRecord> {
    arena
        .iter()
        .enumerate()
        .map(|(index, node)| NodeRecord {
            index,
            parent: node.parent,
            depth: node.depth,
            remaining: node.state.remaining_text(),
            thought: node.thought().map(str::to_string),
            step_score: node.step_score,
            path_score: node.path_score,
        })
        .collect()
}
