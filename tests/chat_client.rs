//! Persona agent over the generative client, against a mock service.

use labkit::chat::{AgentReply, ChatAgent, ChatConfig, GeminiClient, Persona};
use labkit::error::LabError;
use labkit::retry::RetryPolicy;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/models/test-model:generateContent";

fn create_test_agent(server: &MockServer, attempts: u32) -> ChatAgent<GeminiClient> {
    let retry = RetryPolicy::new(attempts, Duration::from_millis(10)).unwrap();
    let config = ChatConfig::new("mock_api_key_for_testing")
        .with_model("test-model")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    let client = GeminiClient::new(config).expect("Failed to build chat client");
    ChatAgent::new(client, Persona::rick(), retry)
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [
            { "content": { "role": "model", "parts": [{ "text": text }] } }
        ]
    }))
}

#[tokio::test]
async fn test_ask_returns_persona_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "mock_api_key_for_testing"))
        .respond_with(text_response("Science, Morty!"))
        .expect(1)
        .mount(&server)
        .await;

    let agent = create_test_agent(&server, 3);
    let reply = agent.ask("What is love?").await.unwrap();
    assert_eq!(reply, AgentReply::Text("Science, Morty!".to_string()));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("The user said: What is love?"));
    assert!(prompt.ends_with("Respond as Rick Sanchez:"));
}

#[tokio::test]
async fn test_conversation_sends_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(text_response("Burp."))
        .expect(2)
        .mount(&server)
        .await;

    let mut agent = create_test_agent(&server, 3);
    agent.start_conversation();
    agent.send("hi").await.unwrap();
    agent.send("again").await.unwrap();
    assert_eq!(agent.conversation().unwrap().turns().len(), 4);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(
        contents[2]["parts"][0]["text"],
        "again\n\n(Respond as Rick Sanchez, staying in character)"
    );
}

#[tokio::test]
async fn test_quota_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let agent = create_test_agent(&server, 3);
    let reply = agent.ask("hello").await.unwrap();
    assert_eq!(reply, AgentReply::CapacityExhausted { attempts: 3 });
}

#[tokio::test]
async fn test_quota_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "rate limit reached", "status": "INTERNAL" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(text_response("Fine."))
        .mount(&server)
        .await;

    let agent = create_test_agent(&server, 3);
    let reply = agent.ask("hello").await.unwrap();
    assert_eq!(reply, AgentReply::Text("Fine.".to_string()));
}

#[tokio::test]
async fn test_rejected_key_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut agent = create_test_agent(&server, 3);
    agent.start_conversation();
    let err = agent.send("hello").await.unwrap_err();
    assert!(matches!(err, LabError::Unauthorized(_)));
    assert!(agent.conversation().unwrap().is_empty());
}
