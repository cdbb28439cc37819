//! HTTP-level tests for the chat client against a local wiremock server.

use oracle::{parse_score, parse_thought, ChatClient, OracleConfig, OracleHandle, PromptSet};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> OracleConfig {
    OracleConfig {
        server_url: server.uri(),
        model: "test-model".to_string(),
        request_timeout_secs: 5,
        ..OracleConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

fn root_context() -> oracle::PromptContext {
    PromptSet::default().propose_context(
        "Reach 24.",
        &["4".to_string(), "9".to_string(), "10".to_string(), "13".to_string()],
        &[],
    )
}

#[tokio::test]
async fn test_health_check_and_propose() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "test-model", "n": 1})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("THOUGHT: 13 - 9 = 4\nREMAINING: [4, 4, 10]")),
        )
        .mount(&server)
        .await;

    let handle = OracleHandle::new(ChatClient::new(config_for(&server)).await.unwrap());
    let text = handle.propose(&root_context()).await.unwrap();

    let parsed = parse_thought(&text).unwrap();
    assert_eq!(parsed.description, "13 - 9 = 4");
    assert_eq!(parsed.remaining, vec!["4", "4", "10"]);
}

#[tokio::test]
async fn test_critique_uses_critique_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.2})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("SCORE: 0.8\nCRITIQUE: Good.")),
        )
        .mount(&server)
        .await;

    let client = ChatClient::build(config_for(&server)).unwrap();
    let text = client.critique(&root_context()).await.unwrap();
    let score = parse_score(&text).unwrap();
    assert!((score.value - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_retries_server_error_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("THOUGHT: x\nREMAINING: [1]")))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = ChatClient::build(config_for(&server)).unwrap();
    let text = client.propose(&root_context()).await.unwrap();
    assert!(text.starts_with("THOUGHT: x"));
}

#[tokio::test]
async fn test_persistent_server_error_gives_up_after_three_tries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let client = ChatClient::build(config_for(&server)).unwrap();
    let err = client.critique(&root_context()).await.unwrap_err();
    assert!(err.to_string().contains("after 3 tries"));
    assert!(err.to_string().contains("overloaded"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::build(config_for(&server)).unwrap();
    let err = client.propose(&root_context()).await.unwrap_err();
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = ChatClient::build(config_for(&server)).unwrap();
    assert!(client.propose(&root_context()).await.is_err());
}

#[tokio::test]
async fn test_unreachable_server_opens_circuit() {
    // Nothing listens on port 9 (discard) in the test environment.
    let config = OracleConfig {
        server_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: 2,
        ..OracleConfig::default()
    };
    let client = ChatClient::build(config).unwrap();
    for _ in 0..3 {
        assert!(client.propose(&root_context()).await.is_err());
    }
    let err = client.propose(&root_context()).await.unwrap_err();
    assert!(err.to_string().contains("circuit breaker open"));
}
