//! Web search boundary.
//!
//! Discovery and Deep-Dive only see this trait. Provider quirks (auth,
//! depth naming, retries) live in the implementations under
//! [`crate::searchers`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How exhaustive a search should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDepth {
    #[default]
    Standard,
    Deep,
}

/// One ranked web result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Web search for open-world discovery.
///
/// An empty result list is a valid answer, not an error. Failures to reach
/// the provider surface as [`ScoutError::SearchUnavailable`](crate::ScoutError).
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search with an explicit depth.
    async fn search_with_depth(&self, query: &str, depth: SearchDepth) -> Result<Vec<SearchHit>>;

    /// Standard-depth search.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.search_with_depth(query, SearchDepth::Standard).await
    }

    /// Page content as markdown, if the provider can fetch pages.
    async fn fetch_page(&self, url: &str) -> Result<Option<String>> {
        let _ = url;
        Ok(None)
    }
}
