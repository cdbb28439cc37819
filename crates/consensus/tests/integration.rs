//! End-to-end attempt runs over MockOracle followed by consensus aggregation.

use std::sync::Arc;

use consensus::{aggregate, Attempt, AttemptConfig, AttemptRunner};
use oracle::PromptSet;
use puzzle::{Game24, PuzzleState, Thought, Value};
use search::mocks::{score_text, thought_text, MockOracle};
use search::{Outcome, SearchConfig, SearchStats, Solution};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn root() -> PuzzleState {
    PuzzleState::parse(&["4", "9", "10", "13"]).unwrap()
}

fn single_branch_runner(attempt_count: usize) -> AttemptRunner {
    let search = SearchConfig {
        branch_factor: 1,
        ..Default::default()
    };
    let attempts = AttemptConfig {
        attempt_count,
        concurrency: 5,
        timeout_per_attempt: 30,
    };
    AttemptRunner::from_configs(search, attempts).unwrap()
}

/// Oracle that continues any of the listed states towards 24.
fn base_oracle() -> MockOracle {
    let mut oracle = MockOracle::new();
    oracle.add_propose_response("Current numbers: [4, 4, 10]", vec![thought_text("10 - 4 = 6", &["4", "6"])]);
    oracle.add_propose_response("Current numbers: [6, 9, 13]", vec![thought_text("13 - 9 = 4", &["4", "6"])]);
    oracle.add_propose_response("Current numbers: [4, 6]", vec![thought_text("4 * 6 = 24", &["24"])]);
    oracle.set_critique_default(vec![score_text(0.8, "Fine."), score_text(0.9, "Good.")]);
    oracle
}

fn solved_attempt(id: usize, answer: &str, path_score: f64) -> Attempt {
    Attempt {
        id,
        outcome: Outcome::Solved(Solution {
            path: vec![Thought::new("4 * 6 = 24", vec![Value::integer(24)])],
            answer: answer.to_string(),
            path_score,
        }),
        stats: SearchStats::default(),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_all_attempts_agree_via_different_paths() {
    let mut oracle = base_oracle();
    oracle.add_propose_response(
        "Current numbers: [4, 9, 10, 13]",
        vec![
            thought_text("13 - 9 = 4", &["4", "4", "10"]),
            thought_text("10 - 4 = 6", &["6", "9", "13"]),
        ],
    );

    let attempts = single_branch_runner(5)
        .run_all(
            Arc::new(oracle),
            Arc::new(Game24::default()),
            Arc::new(PromptSet::default()),
            &root(),
        )
        .await;

    assert_eq!(attempts.len(), 5);
    let first_steps: std::collections::HashSet<String> = attempts
        .iter()
        .filter_map(|a| a.outcome.solution())
        .map(|s| s.path[0].description.clone())
        .collect();
    assert_eq!(first_steps.len(), 2, "attempts should take different paths");

    let result = aggregate(&attempts);
    assert_eq!(result.answer.as_deref(), Some("24"));
    assert_eq!(result.confidence_parts(), (5, 5));
    assert!(result.render().contains("CONFIDENCE: 5/5"));
}

#[tokio::test]
async fn test_exhausted_attempts_excluded_from_confidence() {
    let mut oracle = base_oracle();
    // Two of five root proposals are illegal (13 - 9 is not 5), leaving those attempts stuck.
    oracle.add_propose_response(
        "Current numbers: [4, 9, 10, 13]",
        vec![
            thought_text("13 - 9 = 4", &["4", "4", "10"]),
            thought_text("13 - 9 = 4", &["4", "4", "10"]),
            thought_text("13 - 9 = 5", &["4", "5", "10"]),
            thought_text("10 - 4 = 6", &["6", "9", "13"]),
            thought_text("13 - 9 = 5", &["4", "5", "10"]),
        ],
    );

    let attempts = single_branch_runner(5)
        .run_all(
            Arc::new(oracle),
            Arc::new(Game24::default()),
            Arc::new(PromptSet::default()),
            &root(),
        )
        .await;

    let exhausted = attempts
        .iter()
        .filter(|a| matches!(a.outcome, Outcome::Exhausted(_)))
        .count();
    assert_eq!(exhausted, 2);

    let result = aggregate(&attempts);
    assert_eq!(result.answer.as_deref(), Some("24"));
    assert_eq!(result.confidence_parts(), (3, 3));
    assert_eq!(result.total_attempts, 5);
    assert!(result.render().starts_with("CONSENSUS_ANSWER: 24\nCONFIDENCE: 3/3\nREASONING: "));
}

#[tokio::test]
async fn test_no_attempt_solves() {
    let mut oracle = MockOracle::new();
    oracle.set_propose_default(vec!["I am not sure."]);

    let attempts = single_branch_runner(3)
        .run_all(
            Arc::new(oracle),
            Arc::new(Game24::default()),
            Arc::new(PromptSet::default()),
            &root(),
        )
        .await;

    let result = aggregate(&attempts);
    assert!(!result.has_consensus());
    assert_eq!(result.confidence_parts(), (0, 3));
    assert!(result.render().contains("CONSENSUS_ANSWER: none"));
}

// ---------------------------------------------------------------------------
// Aggregation properties
// ---------------------------------------------------------------------------

#[test]
fn test_aggregate_is_idempotent() {
    let attempts = vec![
        solved_attempt(0, "24", 0.7),
        solved_attempt(1, "6 * 4", 0.8),
        solved_attempt(2, "25", 0.9),
    ];
    let first = aggregate(&attempts);
    let second = aggregate(&attempts);
    assert_eq!(first, second);
    assert_eq!(first.agreeing, 2);
}

#[test]
fn test_equal_tally_and_score_picks_lower_id() {
    for _ in 0..10 {
        let attempts = vec![solved_attempt(4, "25", 0.75), solved_attempt(2, "24", 0.75)];
        let result = aggregate(&attempts);
        assert_eq!(result.winning_attempt, Some(2));
        assert_eq!(result.answer.as_deref(), Some("24"));
    }
}
