//! Pure Linkup REST API client.
//!
//! A minimal client for the Linkup web search API. Supports ranked search
//! results and single-page fetches as markdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use linkup_client::{Depth, LinkupClient, SearchRequest};
//!
//! let client = LinkupClient::new("your-api-key");
//!
//! let results = client
//!     .search(&SearchRequest::new("AI startups in healthcare in Germany").depth(Depth::Deep))
//!     .await?;
//! for item in &results.results {
//!     println!("{} {}", item.name.as_deref().unwrap_or("(untitled)"), item.url);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{LinkupError, Result};
pub use types::{Depth, FetchedPage, SearchRequest, SearchResultItem, SearchResults};

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use types::FetchRequest;

const BASE_URL: &str = "https://api.linkup.so/v1";

#[derive(Clone)]
pub struct LinkupClient {
    client: reqwest::Client,
    api_key: Arc<SecretString>,
    base_url: String,
}

impl std::fmt::Debug for LinkupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkupClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LinkupClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Arc::new(SecretString::from(api_key.into())),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the API root (self-hosted gateways, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LinkupError::Config(e.to_string()))?;
        Ok(self)
    }

    /// Ranked search results.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let results: SearchResults = self.post("search", request).await?;
        tracing::debug!(query = %request.q, count = results.results.len(), "Linkup search");
        Ok(results)
    }

    /// Fetch a single page as markdown.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let page: FetchedPage = self.post("fetch", &FetchRequest { url }).await?;
        tracing::debug!(url, chars = page.markdown.len(), "Linkup fetch");
        Ok(page)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, route: &str, body: &B) -> Result<T> {
        let url = format!("{}/{}", self.base_url, route);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(status = %status, error = %body, "Linkup API error");

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => LinkupError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LinkupError::Auth(body),
        _ => LinkupError::Api {
            status: status.as_u16(),
            message: body,
        },
    })
}
