//! Discovered companies and their identity.

use serde::{Deserialize, Serialize};
use url::Url;

/// A company surfaced by Discovery.
///
/// Identity is the normalized `url` (see [`normalize_url`]); two candidates
/// whose URLs differ only in case or trailing slashes are the same company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub url: String,
    pub country: String,
}

impl Candidate {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            country: country.into(),
        }
    }

    /// Key used for deduplication and result bookkeeping.
    pub fn identity_key(&self) -> String {
        normalize_url(&self.url)
    }

    /// Host part of the URL without a leading `www.`.
    pub fn host(&self) -> Option<String> {
        let parsed = Url::parse(self.url.trim()).ok()?;
        let host = parsed.host_str()?;
        Some(host.strip_prefix("www.").unwrap_or(host).to_string())
    }

    /// True when the URL is an absolute http(s) URL with a host.
    pub fn has_web_url(&self) -> bool {
        Url::parse(self.url.trim())
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false)
    }
}

/// Case-insensitive, trailing-slash-stripped form of a URL.
pub fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_lowercase()
}
