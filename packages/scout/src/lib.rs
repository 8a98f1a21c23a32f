//! Startup scouting pipeline.
//!
//! Turns an investment thesis into a researched list of companies:
//!
//! 1. **Discovery** searches the web and extracts a deduplicated, capped
//!    list of candidate companies.
//! 2. **Deep-Dive** researches every candidate in parallel (bounded
//!    concurrency, per-candidate timeout) and produces one enriched record
//!    per candidate, successful or failed.
//!
//! Progress is published as a typed event stream so callers can forward it
//! to clients as it happens.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scout::{publisher, Pipeline, PipelineConfig, ProgressEvent, ScoutRequest};
//! use scout::testing::{MockLanguageModel, MockWebSearcher};
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = Pipeline::new(
//!     Arc::new(MockWebSearcher::new()),
//!     Arc::new(MockLanguageModel::new()),
//!     PipelineConfig::default(),
//! );
//!
//! let (sink, mut events) = publisher::channel::<ProgressEvent>(64);
//! let request = ScoutRequest::new("AI startups in healthcare").with_location("Germany");
//! let summary = pipeline.run(&request, &sink, &CancellationToken::new()).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Search and language model boundaries
//! - [`types`] - Candidates, enriched companies, runs
//! - [`pipeline`] - Discovery, Deep-Dive and the orchestrator
//! - [`publisher`] - Bounded event delivery with sequence numbers
//! - [`assistant`] - Intent-routed chat over the pipeline
//! - [`searchers`] / [`ai`] - Linkup and OpenAI implementations
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod assistant;
pub mod config;
pub mod enhance;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod publisher;
pub mod retry;
pub mod searchers;
pub mod testing;
pub mod traits;
pub mod types;

pub use assistant::{Assistant, ChatInput, ChatTurn, Intent, IntentKind};
pub use config::PipelineConfig;
pub use enhance::{enhance_query, simple_enhance};
pub use error::{Result, ScoutError};
pub use events::{ChatEvent, ProgressEvent, StreamEvent};
pub use pipeline::{DeepDive, Discovery, Pipeline, ResearchBrief, RunState};
pub use publisher::{Envelope, EventSink, EventStream, LagTracker};
pub use retry::RetryPolicy;
pub use traits::{
    llm::{Completion, LanguageModel, OutputSchema, Prompt},
    searcher::{SearchDepth, SearchHit, WebSearcher},
};
pub use types::{
    candidate::{normalize_url, Candidate},
    company::{EnrichedCompany, EnrichmentStatus},
    request::ScoutRequest,
    run::{PipelineRun, RunSummary},
};
