//! Linkup-backed web searcher.

use async_trait::async_trait;
use linkup_client::{Depth, LinkupClient, LinkupError, SearchRequest};
use openai_client::truncate_to_char_boundary;

use crate::error::{Result, ScoutError};
use crate::retry::{RetryError, RetryPolicy};
use crate::traits::searcher::{SearchDepth, SearchHit, WebSearcher};

const SNIPPET_MAX_BYTES: usize = 500;

/// Web searcher over the Linkup API with retry on rate limits.
pub struct LinkupSearcher {
    client: LinkupClient,
    retry: RetryPolicy,
    max_results: usize,
}

impl LinkupSearcher {
    pub fn new(client: LinkupClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            max_results: 10,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl WebSearcher for LinkupSearcher {
    async fn search_with_depth(&self, query: &str, depth: SearchDepth) -> Result<Vec<SearchHit>> {
        let depth = match depth {
            SearchDepth::Standard => Depth::Standard,
            SearchDepth::Deep => Depth::Deep,
        };
        let request = SearchRequest::new(query).depth(depth);

        let results = self
            .retry
            .run("linkup_search", || self.client.search(&request))
            .await
            .map_err(unavailable)?;

        let hits: Vec<SearchHit> = results
            .results
            .into_iter()
            .filter(|item| item.kind.as_deref() != Some("image"))
            .map(|item| {
                let snippet = item.content.unwrap_or_default();
                SearchHit {
                    title: item.name.unwrap_or_else(|| item.url.clone()),
                    snippet: truncate_to_char_boundary(&snippet, SNIPPET_MAX_BYTES).to_string(),
                    url: item.url,
                }
            })
            .take(self.max_results)
            .collect();

        tracing::info!(query, hits = hits.len(), "Web search completed");
        Ok(hits)
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<String>> {
        let page = self
            .retry
            .run("linkup_fetch", || self.client.fetch(url))
            .await
            .map_err(unavailable)?;

        Ok(Some(page.markdown).filter(|m| !m.trim().is_empty()))
    }
}

fn unavailable(err: RetryError<LinkupError>) -> ScoutError {
    ScoutError::SearchUnavailable(format!("{} (after {} attempts)", err.error, err.attempts))
}
