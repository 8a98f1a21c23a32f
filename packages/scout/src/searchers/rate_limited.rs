//! Rate-limited searcher wrapper.
//!
//! Wraps any WebSearcher with a request quota using the governor crate.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};

use crate::error::Result;
use crate::traits::searcher::{SearchDepth, SearchHit, WebSearcher};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A searcher that waits for a permit before every upstream call.
pub struct RateLimitedSearcher<S: WebSearcher> {
    inner: S,
    limiter: Arc<DefaultRateLimiter>,
}

impl<S: WebSearcher> RateLimitedSearcher<S> {
    /// Allow `requests_per_second` sustained requests.
    pub fn new(searcher: S, requests_per_second: NonZeroU32) -> Self {
        Self::with_quota(searcher, Quota::per_second(requests_per_second))
    }

    pub fn with_quota(searcher: S, quota: Quota) -> Self {
        Self {
            inner: searcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl<S: WebSearcher> WebSearcher for RateLimitedSearcher<S> {
    async fn search_with_depth(&self, query: &str, depth: SearchDepth) -> Result<Vec<SearchHit>> {
        self.limiter.until_ready().await;
        self.inner.search_with_depth(query, depth).await
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<String>> {
        self.limiter.until_ready().await;
        self.inner.fetch_page(url).await
    }
}
