//! Integration tests for the search crate using MockOracle and a wiremock chat server.
//!
//! No model is needed. The HTTP tests run the real `ChatClient` against a
//! local server that answers by matching the rendered prompt.

use std::sync::Arc;

use oracle::{ChatClient, OracleConfig, OracleHandle, PromptSet};
use puzzle::{Game24, LegalityChecker, PuzzleError, PuzzleState, Thought, Value};
use search::mocks::{score_text, thought_text, MockOracle};
use search::{ExhaustReason, Oracle, Outcome, SearchConfig, SearchEngine, SearchResult};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn root(xs: &[i64]) -> PuzzleState {
    PuzzleState::new(xs.iter().copied().map(Value::integer).collect()).unwrap()
}

async fn run(oracle: &dyn Oracle, checker: &dyn LegalityChecker, config: SearchConfig, xs: &[i64]) -> SearchResult {
    SearchEngine::new(config)
        .unwrap()
        .run(oracle, checker, &PromptSet::default(), &root(xs))
        .await
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

fn expect_exhausted(result: &SearchResult) {
    assert!(
        matches!(result.outcome, Outcome::Exhausted(_)),
        "Expected Exhausted, got {:?}",
        result.outcome
    );
}

/// Puzzle where each step removes one operand; solved when exactly one remains.
struct DropOne;

impl LegalityChecker for DropOne {
    fn describe(&self) -> String {
        "Remove one number per step until one is left.".to_string()
    }

    fn is_legal(&self, state: &PuzzleState, thought: &Thought) -> Result<bool, PuzzleError> {
        let parent = state.remaining();
        let proposed = &thought.resulting_remaining;
        if proposed.len() + 1 != parent.len() {
            return Ok(false);
        }
        Ok((0..parent.len()).any(|skip| {
            let mut rest: Vec<Value> = parent
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, v)| *v)
                .collect();
            let mut proposed = proposed.clone();
            rest.sort();
            proposed.sort();
            rest == proposed
        }))
    }

    fn is_terminal(&self, state: &PuzzleState) -> Result<bool, PuzzleError> {
        Ok(state.remaining().len() == 1)
    }

    fn extract_answer(&self, state: &PuzzleState) -> Result<String, PuzzleError> {
        Ok(state.remaining_text().join(""))
    }
}

// ---------------------------------------------------------------------------
// Mock oracle scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_low_scores_at_root_exhaust_with_single_expansion() {
    let mut oracle = MockOracle::new();
    oracle.set_propose_default(vec![
        thought_text("13 - 9 = 4", &["4", "4", "10"]),
        thought_text("10 - 4 = 6", &["6", "9", "13"]),
        thought_text("4 * 9 = 36", &["36", "10", "13"]),
    ]);
    oracle.set_critique_default(vec![score_text(0.1, "Dead end."), score_text(0.49, "Meh.")]);

    let result = run(&oracle, &Game24::default(), SearchConfig::default(), &[4, 9, 10, 13]).await;

    assert_eq!(result.outcome, Outcome::Exhausted(ExhaustReason::FrontierEmpty));
    assert_eq!(result.stats.nodes_expanded, 1);
    assert_eq!(result.stats.total_states, 1);
    assert_eq!(oracle.critique_calls(), 3);
}

#[tokio::test]
async fn test_missing_remaining_line_never_crashes() {
    let mut oracle = MockOracle::new();
    oracle.set_propose_default(vec![
        "THOUGHT: 13 - 9 = 4",
        "I think we should subtract.",
        "",
    ]);
    oracle.set_critique_default(vec![score_text(1.0, "")]);

    let result = run(&oracle, &Game24::default(), SearchConfig::default(), &[4, 9, 10, 13]).await;

    expect_exhausted(&result);
    assert_eq!(result.stats.malformed_proposals, 3);
    assert_eq!(result.stats.dead_ends, 1);
    assert_eq!(oracle.critique_calls(), 0);
}

#[tokio::test]
async fn test_engine_is_puzzle_agnostic() {
    let mut oracle = MockOracle::new();
    oracle.set_propose_default(vec![
        thought_text("drop 1", &["2", "3"]),
        thought_text("drop 3", &["2"]),
    ]);
    oracle.set_critique_default(vec![score_text(0.8, "")]);

    let config = SearchConfig {
        branch_factor: 1,
        ..Default::default()
    };
    // Rotation: root gets "drop 1" (legal), [2, 3] gets "drop 3" (legal, terminal)
    let result = run(&oracle, &DropOne, config, &[1, 2, 3]).await;

    let solution = result.outcome.solution().expect("should solve");
    assert_eq!(solution.answer, "2");
    assert_eq!(solution.path.len(), 2);
}

#[tokio::test]
async fn test_shared_oracle_across_concurrent_attempts() {
    let mut mock = MockOracle::new();
    mock.add_propose_response("[4, 9, 10, 13]", vec![thought_text("13 - 9 = 4", &["4", "4", "10"])]);
    mock.add_propose_response("[4, 4, 10]", vec![thought_text("10 - 4 = 6", &["4", "6"])]);
    mock.add_propose_response("[4, 6]", vec![thought_text("4 * 6 = 24", &["24"])]);
    mock.set_critique_default(vec![score_text(0.9, "")]);
    let oracle: Arc<dyn Oracle> = Arc::new(mock);
    let checker: Arc<dyn LegalityChecker> = Arc::new(Game24::default());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let oracle = Arc::clone(&oracle);
        let checker = Arc::clone(&checker);
        handles.push(tokio::spawn(async move {
            SearchEngine::new(SearchConfig::default())
                .unwrap()
                .run(oracle.as_ref(), checker.as_ref(), &PromptSet::default(), &root(&[4, 9, 10, 13]))
                .await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert_eq!(result.outcome.solution().map(|s| s.answer.as_str()), Some("24"));
    }
}

// ---------------------------------------------------------------------------
// Real ChatClient against wiremock
// ---------------------------------------------------------------------------

async fn mount_reply(server: &MockServer, needle: &str, content: &str, priority: u8) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(needle))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .with_priority(priority)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_over_http_oracle() {
    let server = MockServer::start().await;
    // Critique prompts contain "Proposed step", so they must win over the state matchers.
    mount_reply(&server, "Proposed step", "SCORE: 0.85\nCRITIQUE: Sound arithmetic.", 1).await;
    mount_reply(&server, "Current numbers: [4, 9, 10, 13]", "THOUGHT: 13 - 9 = 4\nREMAINING: [4, 4, 10]", 2).await;
    mount_reply(&server, "Current numbers: [4, 4, 10]", "THOUGHT: 10 - 4 = 6\nREMAINING: [4, 6]", 2).await;
    mount_reply(&server, "Current numbers: [4, 6]", "THOUGHT: 4 * 6 = 24\nREMAINING: [24]", 2).await;

    let config = OracleConfig {
        server_url: server.uri(),
        request_timeout_secs: 5,
        ..OracleConfig::default()
    };
    let handle = OracleHandle::new(ChatClient::build(config).unwrap());
    let search_config = SearchConfig {
        branch_factor: 2,
        ..Default::default()
    };

    let result = SearchEngine::new(search_config)
        .unwrap()
        .run(&handle, &Game24::default(), handle.prompts(), &root(&[4, 9, 10, 13]))
        .await;

    let solution = result.outcome.solution().expect("should solve over HTTP");
    assert_eq!(solution.answer, "24");
    assert!((solution.path_score - 0.85).abs() < 1e-9);
    assert_eq!(solution.path.len(), 3);
}

#[tokio::test]
async fn test_http_errors_are_skipped_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("context too long"))
        .mount(&server)
        .await;

    let config = OracleConfig {
        server_url: server.uri(),
        request_timeout_secs: 5,
        ..OracleConfig::default()
    };
    let handle = OracleHandle::new(ChatClient::build(config).unwrap());

    let result = run(&handle, &Game24::default(), SearchConfig::default(), &[4, 9, 10, 13]).await;

    expect_exhausted(&result);
    assert_eq!(result.stats.propose_calls, 3);
    assert_eq!(result.stats.propose_failures, 3);
}
