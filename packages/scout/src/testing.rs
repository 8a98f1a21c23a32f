//! Testing utilities including mock implementations.
//!
//! These let applications (and this crate's own tests) drive the pipeline
//! without making real search or LLM calls. Both mocks are scripted by
//! substring match on the incoming query/prompt, record every call, and can
//! inject failures. Model replies can also be delayed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, ScoutError};
use crate::traits::{
    llm::{Completion, LanguageModel, OutputSchema, Prompt},
    searcher::{SearchDepth, SearchHit, WebSearcher},
};

// =============================================================================
// MockWebSearcher
// =============================================================================

/// Record of a call made to the mock searcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCall {
    Search { query: String, depth: SearchDepth },
    Fetch { url: String },
}

/// A scripted web searcher.
///
/// Queries are matched against registered substrings in registration order;
/// the first match wins. Unmatched queries return no hits.
#[derive(Default)]
pub struct MockWebSearcher {
    hits: RwLock<Vec<(String, Vec<SearchHit>)>>,
    failures: RwLock<Vec<(String, ScoutError)>>,
    pages: RwLock<HashMap<String, String>>,
    calls: RwLock<Vec<SearchCall>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `hits` for queries containing `pattern`.
    pub fn with_hits(self, pattern: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        self.hits.write().unwrap().push((pattern.into(), hits));
        self
    }

    /// Fail queries containing `pattern`. Failures win over hits.
    pub fn with_failure(self, pattern: impl Into<String>, error: ScoutError) -> Self {
        self.failures.write().unwrap().push((pattern.into(), error));
        self
    }

    /// Fail every search.
    pub fn unavailable(self) -> Self {
        self.with_failure("", ScoutError::SearchUnavailable("mock outage".into()))
    }

    /// Serve `markdown` for `fetch_page(url)`.
    pub fn with_page(self, url: impl Into<String>, markdown: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), markdown.into());
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.read().unwrap().clone()
    }

    /// Queries of all search calls so far.
    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SearchCall::Search { query, .. } => Some(query),
                SearchCall::Fetch { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search_with_depth(&self, query: &str, depth: SearchDepth) -> Result<Vec<SearchHit>> {
        self.calls.write().unwrap().push(SearchCall::Search {
            query: query.to_string(),
            depth,
        });

        if let Some((_, error)) = self
            .failures
            .read()
            .unwrap()
            .iter()
            .find(|(pattern, _)| query.contains(pattern.as_str()))
        {
            return Err(error.clone());
        }

        Ok(self
            .hits
            .read()
            .unwrap()
            .iter()
            .find(|(pattern, _)| query.contains(pattern.as_str()))
            .map(|(_, hits)| hits.clone())
            .unwrap_or_default())
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<String>> {
        self.calls.write().unwrap().push(SearchCall::Fetch {
            url: url.to_string(),
        });
        Ok(self.pages.read().unwrap().get(url).cloned())
    }
}

// =============================================================================
// MockLanguageModel
// =============================================================================

/// A scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Text(String),
    Fail(ScoutError),
    /// Sleep, then answer with the inner reply.
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn json(value: Value) -> Self {
        Self::Json(value)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn fail(error: ScoutError) -> Self {
        Self::Fail(error)
    }

    pub fn after(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

#[derive(Debug, Clone)]
struct Rule {
    schema: Option<String>,
    contains: Option<String>,
    reply: MockReply,
}

impl Rule {
    fn matches(&self, prompt: &Prompt, schema: Option<&OutputSchema>) -> bool {
        let schema_ok = match (&self.schema, schema) {
            (None, _) => true,
            (Some(want), Some(got)) => *want == got.name,
            (Some(_), None) => false,
        };
        let text_ok = self
            .contains
            .as_deref()
            .map(|needle| prompt.user.contains(needle) || prompt.system.contains(needle))
            .unwrap_or(true);
        schema_ok && text_ok
    }
}

/// Record of a call made to the mock model.
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub prompt: Prompt,
    pub schema: Option<String>,
}

/// A scripted language model.
///
/// Rules are matched in registration order on the requested schema name
/// and/or a substring of the prompt. Unmatched calls fail with
/// `LlmUnavailable`. Tracks the peak number of concurrent calls.
#[derive(Default)]
pub struct MockLanguageModel {
    rules: RwLock<Vec<Rule>>,
    calls: RwLock<Vec<LlmCall>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls requesting the schema named `schema`.
    pub fn on_schema(self, schema: impl Into<String>, reply: MockReply) -> Self {
        self.rule(Some(schema.into()), None, reply)
    }

    /// Answer calls whose prompt contains `needle`.
    pub fn on_prompt(self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rule(None, Some(needle.into()), reply)
    }

    /// Answer calls matching both a schema and a prompt substring.
    pub fn on(self, schema: impl Into<String>, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rule(Some(schema.into()), Some(needle.into()), reply)
    }

    fn rule(self, schema: Option<String>, contains: Option<String>, reply: MockReply) -> Self {
        self.rules.write().unwrap().push(Rule {
            schema,
            contains,
            reply,
        });
        self
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.read().unwrap().clone()
    }

    /// Calls that requested the given schema.
    pub fn calls_for(&self, schema: &str) -> Vec<LlmCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.schema.as_deref() == Some(schema))
            .collect()
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, prompt: &Prompt, schema: Option<&OutputSchema>) -> Result<Completion> {
        self.calls.write().unwrap().push(LlmCall {
            prompt: prompt.clone(),
            schema: schema.map(|s| s.name.clone()),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));

        let reply = self
            .rules
            .read()
            .unwrap()
            .iter()
            .find(|r| r.matches(prompt, schema))
            .map(|r| r.reply.clone());

        let mut reply = reply.unwrap_or_else(|| {
            MockReply::Fail(ScoutError::LlmUnavailable("no scripted reply".into()))
        });

        loop {
            match reply {
                MockReply::Json(value) => return Ok(Completion::Structured(value)),
                MockReply::Text(text) => return Ok(Completion::Text(text)),
                MockReply::Fail(error) => return Err(error),
                MockReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let llm = MockLanguageModel::new()
            .on_prompt("Acme", MockReply::text("acme"))
            .on_prompt("", MockReply::text("fallback"));

        let reply = llm.complete(&Prompt::new("sys", "about Acme"), None).await.unwrap();
        assert_eq!(reply, Completion::Text("acme".into()));

        let reply = llm.complete(&Prompt::new("sys", "other"), None).await.unwrap();
        assert_eq!(reply, Completion::Text("fallback".into()));
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_schema_rule_requires_schema() {
        let schema = OutputSchema {
            name: "Thing".into(),
            schema: json!({}),
        };
        let llm = MockLanguageModel::new().on_schema("Thing", MockReply::json(json!({"a": 1})));

        assert!(llm.complete(&Prompt::new("", ""), None).await.is_err());
        let reply = llm.complete(&Prompt::new("", ""), Some(&schema)).await.unwrap();
        assert_eq!(reply, Completion::Structured(json!({"a": 1})));
        assert_eq!(llm.calls_for("Thing").len(), 1);
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_searcher_failure_wins_over_hits() {
        let searcher = MockWebSearcher::new()
            .with_hits("acme", vec![SearchHit::new("Acme", "https://acme.com", "")])
            .with_failure("acme", ScoutError::SearchUnavailable("down".into()));

        assert!(searcher.search("acme").await.is_err());
        assert_eq!(searcher.queries(), vec!["acme"]);
    }
}
