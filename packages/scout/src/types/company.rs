//! Deep-dive results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::candidate::Candidate;

/// Outcome of a single candidate's deep dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Ok,
    Failed,
}

/// A candidate plus everything the deep dive learned about it.
///
/// Descriptive fields are `None` when the research produced no value; that is
/// distinct from an empty string and never invented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCompany {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub description: Option<String>,
    pub founded_year: Option<u16>,
    pub funding_stage: Option<String>,
    pub arr: Option<String>,
    pub market_sector: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Caller-requested attributes; absent keys were not found.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub status: EnrichmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichedCompany {
    /// A successful record with no fields filled yet.
    pub fn ok(candidate: Candidate) -> Self {
        Self {
            candidate,
            description: None,
            founded_year: None,
            funding_stage: None,
            arr: None,
            market_sector: None,
            competitors: Vec::new(),
            attributes: BTreeMap::new(),
            status: EnrichmentStatus::Ok,
            error: None,
        }
    }

    pub fn failed(candidate: Candidate, error: impl Into<String>) -> Self {
        Self {
            status: EnrichmentStatus::Failed,
            error: Some(error.into()),
            ..Self::ok(candidate)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == EnrichmentStatus::Ok
    }

    pub fn identity_key(&self) -> String {
        self.candidate.identity_key()
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }
}
