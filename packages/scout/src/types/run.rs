//! Per-run bookkeeping.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::Candidate;
use super::company::EnrichedCompany;

/// Mutable state of a single scouting run.
///
/// Owned by the orchestrator. `results` is keyed by candidate identity and
/// only ever holds keys that appear in `candidates`, each at most once.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    pub query: String,
    pub candidates: Vec<Candidate>,
    pub results: IndexMap<String, EnrichedCompany>,
    pub started_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            candidates: Vec::new(),
            results: IndexMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Store a deep-dive outcome. Returns `false` (and stores nothing) when
    /// the company is not a candidate of this run or was already recorded.
    pub fn record(&mut self, company: EnrichedCompany) -> bool {
        let key = company.identity_key();
        if !self.candidates.iter().any(|c| c.identity_key() == key) {
            tracing::warn!(run_id = %self.id, key, "Ignoring result for unknown candidate");
            return false;
        }
        if self.results.contains_key(&key) {
            tracing::warn!(run_id = %self.id, key, "Ignoring duplicate result");
            return false;
        }
        self.results.insert(key, company);
        true
    }

    /// Every candidate has exactly one recorded outcome.
    pub fn is_settled(&self) -> bool {
        self.results.len() == self.candidates.len()
    }

    /// Freeze the run into a summary, ordering results like the candidates.
    pub fn summarize(&self) -> RunSummary {
        let results: Vec<EnrichedCompany> = self
            .candidates
            .iter()
            .filter_map(|c| self.results.get(&c.identity_key()).cloned())
            .collect();
        let succeeded = results.iter().filter(|c| c.is_ok()).count();

        RunSummary {
            run_id: self.id,
            query: self.query.clone(),
            candidates: self.candidates.len(),
            succeeded,
            failed: results.len() - succeeded,
            started_at: self.started_at,
            finished_at: Utc::now(),
            results,
        }
    }
}

/// Final output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub query: String,
    pub candidates: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<EnrichedCompany>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(urls: &[&str]) -> PipelineRun {
        let mut run = PipelineRun::new("q");
        run.candidates = urls
            .iter()
            .map(|u| Candidate::new(*u, *u, "DE"))
            .collect();
        run
    }

    #[test]
    fn test_record_rejects_unknown_and_duplicates() {
        let mut run = run_with(&["https://a.com", "https://b.com"]);

        assert!(run.record(EnrichedCompany::ok(Candidate::new("A", "https://a.com/", "DE"))));
        assert!(!run.record(EnrichedCompany::failed(
            Candidate::new("A", "https://a.com", "DE"),
            "timeout"
        )));
        assert!(!run.record(EnrichedCompany::ok(Candidate::new("Z", "https://z.com", "DE"))));
        assert!(!run.is_settled());

        assert!(run.record(EnrichedCompany::failed(
            Candidate::new("B", "https://b.com", "DE"),
            "timeout"
        )));
        assert!(run.is_settled());
    }

    #[test]
    fn test_summary_follows_candidate_order() {
        let mut run = run_with(&["https://a.com", "https://b.com"]);
        run.record(EnrichedCompany::ok(Candidate::new("B", "https://b.com", "DE")));
        run.record(EnrichedCompany::failed(Candidate::new("A", "https://a.com", "DE"), "x"));

        let summary = run.summarize();
        assert_eq!(summary.results[0].name(), "A");
        assert_eq!(summary.results[1].name(), "B");
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
    }
}
