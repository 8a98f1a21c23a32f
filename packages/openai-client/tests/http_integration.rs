//! HTTP-level tests against a mock OpenAI server.

use std::time::Duration;

use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
struct Companies {
    companies: Vec<String>,
}

#[tokio::test]
async fn test_chat_completion_returns_content_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello there")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new("sk-test").with_base_url(server.uri());
    let response = client
        .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("Hi")))
        .await
        .unwrap();

    assert_eq!(response.content, "Hello there");
    assert_eq!(response.usage.unwrap().total_tokens, 15);
}

#[tokio::test]
async fn test_extract_deserializes_structured_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body(r#"{"companies":["Ada Health","Merantix"]}"#)),
        )
        .mount(&server)
        .await;

    let client = OpenAIClient::new("sk-test").with_base_url(server.uri());
    let found: Companies = client
        .extract("gpt-4o-mini", "system", "user")
        .await
        .unwrap();

    assert_eq!(found.companies, vec!["Ada Health", "Merantix"]);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(body["response_format"]["json_schema"]["name"], "Companies");
    assert_eq!(body["response_format"]["json_schema"]["strict"], true);
}

#[tokio::test]
async fn test_rate_limit_is_classified_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let client = OpenAIClient::new("sk-test").with_base_url(server.uri());
    let err = client
        .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("Hi")))
        .await
        .unwrap_err();

    match err {
        OpenAIError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(2)))
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_and_server_errors_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer bad-key"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let request = ChatRequest::new("gpt-4o-mini").message(Message::user("Hi"));

    let err = OpenAIClient::new("bad-key")
        .with_base_url(server.uri())
        .chat_completion(request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, OpenAIError::Auth(_)), "got {err:?}");

    let err = OpenAIClient::new("sk-test")
        .with_base_url(server.uri())
        .chat_completion(request)
        .await
        .unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}

#[tokio::test]
async fn test_azure_uses_deployment_path_and_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/scout-gpt/chat/completions"))
        .and(query_param("api-version", "2025-03-01-preview"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::azure("azure-key", server.uri(), "scout-gpt")
        .with_api_version("2025-03-01-preview");
    let response = client
        .chat_completion(ChatRequest::new("ignored").message(Message::user("Hi")))
        .await
        .unwrap();

    assert_eq!(response.content, "ok");
}

#[tokio::test]
async fn test_refusal_surfaces_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null, "refusal": "no" } }]
        })))
        .mount(&server)
        .await;

    let client = OpenAIClient::new("sk-test").with_base_url(server.uri());
    let err = client
        .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("Hi")))
        .await
        .unwrap_err();

    assert!(matches!(err, OpenAIError::Api { status: 200, .. }), "got {err:?}");
}
