use serde::{Deserialize, Serialize};

/// How hard Linkup searches. `Deep` is slower and more exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    #[default]
    Standard,
    Deep,
}

/// Body for `POST /v1/search`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub q: String,
    pub depth: Depth,
    /// Always `searchResults`; this client only reads ranked results.
    output_type: &'static str,
    pub include_images: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            q: query.into(),
            depth: Depth::Standard,
            output_type: "searchResults",
            include_images: false,
        }
    }

    pub fn depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }
}

/// Response to a `searchResults` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<SearchResultItem>,
}

/// A single Linkup search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultItem {
    /// `text` or `image`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Body for `POST /v1/fetch`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FetchRequest<'a> {
    pub url: &'a str,
}

/// Response from `POST /v1/fetch`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedPage {
    #[serde(default)]
    pub markdown: String,
}
