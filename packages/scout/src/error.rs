//! Typed errors for the scouting pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Every variant carries
//! a human-readable cause and maps to a stable machine code that is embedded
//! in terminal stream events.

use thiserror::Error;

/// Errors surfaced by the search/LLM boundaries and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoutError {
    /// Search provider unreachable, rejected our key, or kept failing
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    /// LLM provider unreachable or returned an error
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// LLM kept answering 429 after client-side backoff
    #[error("LLM rate limited after {attempts} attempts")]
    LlmRateLimited { attempts: u32 },

    /// A single candidate's deep dive ran past its deadline
    #[error("timeout")]
    EnrichmentTimeout,

    /// The triggering request went away
    #[error("run cancelled")]
    RunCancelled,

    /// Caller sent something we cannot act on
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Model output did not match the requested shape
    #[error("could not parse model output: {0}")]
    Parse(String),
}

impl ScoutError {
    /// Stable snake_case identifier for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SearchUnavailable(_) => "search_unavailable",
            Self::LlmUnavailable(_) => "llm_unavailable",
            Self::LlmRateLimited { .. } => "llm_rate_limited",
            Self::EnrichmentTimeout => "enrichment_timeout",
            Self::RunCancelled => "run_cancelled",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Parse(_) => "parse_error",
        }
    }
}

/// Result type alias for scouting operations.
pub type Result<T> = std::result::Result<T, ScoutError>;
