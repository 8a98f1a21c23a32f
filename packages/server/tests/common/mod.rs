//! Shared helpers for route tests.
//!
//! Builds the router over scripted searchers/models and decodes SSE bodies.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use scout::{
    testing::{MockLanguageModel, MockWebSearcher},
    PipelineConfig,
};
use serde_json::Value;
use server_core::server::{build_app, AxumAppState};
use tower::ServiceExt;

pub fn test_app(searcher: MockWebSearcher, llm: MockLanguageModel) -> Router {
    let state = AxumAppState::new(
        Arc::new(searcher),
        Arc::new(llm),
        PipelineConfig::default(),
        64,
    );
    build_app(state, &[])
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// One decoded SSE message.
#[derive(Debug, Clone, PartialEq)]
pub struct SseMessage {
    pub event: String,
    pub id: Option<u64>,
    pub data: Value,
}

pub fn parse_sse(body: &str) -> Vec<SseMessage> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut id = None;
            let mut data = String::new();
            for line in block.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    event = Some(v.trim().to_string());
                } else if let Some(v) = line.strip_prefix("id:") {
                    id = v.trim().parse().ok();
                } else if let Some(v) = line.strip_prefix("data:") {
                    data.push_str(v.trim_start());
                }
            }
            let event = event?;
            let data = serde_json::from_str(&data).unwrap_or(Value::Null);
            Some(SseMessage { event, id, data })
        })
        .collect()
}

pub fn event_names(messages: &[SseMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.event.as_str()).collect()
}
