//! Pipeline tuning knobs.

use std::time::Duration;

/// Limits applied to every scouting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Deep dives allowed in flight at once.
    pub max_concurrency: usize,
    /// Candidates kept after deduplication.
    pub max_candidates: usize,
    /// Deadline for a single candidate's deep dive.
    pub enrichment_timeout: Duration,
    /// Ask the LLM to rewrite the discovery query first.
    pub refine_query: bool,
    /// Pull each candidate's homepage into the deep-dive prompt.
    pub fetch_websites: bool,
    /// Search hits passed to a deep-dive prompt.
    pub deep_dive_hits: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            max_candidates: 10,
            enrichment_timeout: Duration::from_secs(90),
            refine_query: false,
            fetch_websites: true,
            deep_dive_hits: 5,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n;
        self
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    pub fn with_refine_query(mut self, refine: bool) -> Self {
        self.refine_query = refine;
        self
    }

    pub fn with_fetch_websites(mut self, fetch: bool) -> Self {
        self.fetch_websites = fetch;
        self
    }
}
