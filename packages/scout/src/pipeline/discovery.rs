//! Discovery: turn a request into a deduplicated candidate list.

use std::collections::HashSet;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::prompts::{format_discovery_prompt, format_refine_prompt};
use crate::error::Result;
use crate::traits::{
    llm::{complete_text, extract, LanguageModel},
    searcher::{SearchDepth, SearchHit, WebSearcher},
};
use crate::types::{candidate::Candidate, request::ScoutRequest};

/// LLM answer shape for candidate extraction.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DiscoveredCompanies {
    pub companies: Vec<DiscoveredCompany>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DiscoveredCompany {
    pub name: String,
    pub url: String,
    pub country: String,
}

pub struct Discovery {
    searcher: Arc<dyn WebSearcher>,
    llm: Arc<dyn LanguageModel>,
    max_candidates: usize,
    refine_query: bool,
}

impl Discovery {
    pub fn new(searcher: Arc<dyn WebSearcher>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            searcher,
            llm,
            max_candidates: 10,
            refine_query: false,
        }
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    pub fn with_refine_query(mut self, refine: bool) -> Self {
        self.refine_query = refine;
        self
    }

    /// Search, extract candidates, dedupe, and cap.
    ///
    /// Fails only when the search itself is unavailable. Zero hits is an
    /// empty (successful) result. If the LLM cannot extract candidates, the
    /// search hits themselves become candidates.
    pub async fn discover(&self, request: &ScoutRequest) -> Result<Vec<Candidate>> {
        let query = self.build_query(request).await;
        let hits = self
            .searcher
            .search_with_depth(&query, SearchDepth::Deep)
            .await?;

        if hits.is_empty() {
            tracing::info!(query, "Discovery found no results");
            return Ok(Vec::new());
        }

        let prompt = format_discovery_prompt(request, &hits);
        let raw = match extract::<DiscoveredCompanies>(self.llm.as_ref(), &prompt).await {
            Ok(found) => found
                .companies
                .into_iter()
                .map(|c| Candidate::new(c.name.trim(), c.url.trim(), c.country.trim()))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Candidate extraction failed, using raw search hits");
                candidates_from_hits(&hits, request.location())
            }
        };

        let candidates = dedupe_candidates(raw, self.max_candidates);
        tracing::info!(query, hits = hits.len(), candidates = candidates.len(), "Discovery completed");
        Ok(candidates)
    }

    async fn build_query(&self, request: &ScoutRequest) -> String {
        let query = request.search_query();
        if !self.refine_query {
            return query;
        }

        match complete_text(self.llm.as_ref(), &format_refine_prompt(&query)).await {
            Ok(refined) if !refined.trim().is_empty() => {
                let refined = refined.trim().trim_matches('"').to_string();
                tracing::debug!(original = %query, refined = %refined, "Refined discovery query");
                refined
            }
            Ok(_) => query,
            Err(e) => {
                tracing::warn!(error = %e, "Query refinement failed, using raw query");
                query
            }
        }
    }
}

/// Fallback: one candidate per search hit.
pub fn candidates_from_hits(hits: &[SearchHit], location: Option<&str>) -> Vec<Candidate> {
    let country = location.unwrap_or("Unknown");
    hits.iter()
        .map(|hit| Candidate::new(hit.title.trim(), hit.url.trim(), country))
        .collect()
}

/// Keep the first occurrence of each identity, drop entries without a
/// usable web URL or name, and cap the list.
pub fn dedupe_candidates(
    candidates: impl IntoIterator<Item = Candidate>,
    limit: usize,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            let usable = c.has_web_url() && !c.name.trim().is_empty();
            if !usable {
                tracing::debug!(name = %c.name, url = %c.url, "Dropping candidate without usable URL");
            }
            usable
        })
        .filter(|c| seen.insert(c.identity_key()))
        .take(limit)
        .collect()
}
