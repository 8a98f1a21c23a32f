//! Scouting pipeline: Discovery, then parallel Deep-Dives.
//!
//! The orchestrator owns a run's state and is the only writer of its
//! results. It walks a fixed state machine:
//!
//! ```text
//! Idle → DiscoveryInFlight → EnrichmentInFlight → Completed
//!             │                      │
//!             └→ DiscoveryFailed     └→ Cancelled
//! ```
//!
//! Deep dives run with bounded concurrency and report in completion order.
//! Every candidate ends up with exactly one result before `RunCompleted` is
//! published. Cancelling the token (or dropping the consumer) stops the run
//! without emitting further events.

pub mod deep_dive;
pub mod discovery;
pub mod prompts;

pub use deep_dive::{research_query, CompanyProfile, DeepDive, ResearchBrief};
pub use discovery::{candidates_from_hits, dedupe_candidates, Discovery};

use std::sync::Arc;

use futures::{stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::{Result, ScoutError};
use crate::events::{ProgressEvent, StreamEvent};
use crate::publisher::EventSink;
use crate::traits::{llm::LanguageModel, searcher::WebSearcher};
use crate::types::{
    company::EnrichedCompany,
    request::ScoutRequest,
    run::{PipelineRun, RunSummary},
};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    DiscoveryInFlight,
    DiscoveryFailed,
    EnrichmentInFlight,
    Completed,
    Cancelled,
}

impl RunState {
    /// Legal transitions of the state machine.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, DiscoveryInFlight)
                | (DiscoveryInFlight, DiscoveryFailed)
                | (DiscoveryInFlight, EnrichmentInFlight)
                | (DiscoveryInFlight, Completed)
                | (DiscoveryInFlight, Cancelled)
                | (EnrichmentInFlight, Completed)
                | (EnrichmentInFlight, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::DiscoveryFailed | Self::Completed | Self::Cancelled)
    }
}

/// Tracks the current state and logs every transition.
struct StateMachine {
    run_id: uuid::Uuid,
    state: RunState,
}

impl StateMachine {
    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} → {:?}",
            self.state,
            next
        );
        tracing::debug!(run_id = %self.run_id, from = ?self.state, to = ?next, "Run state changed");
        self.state = next;
    }
}

/// Discovery → Deep-Dive orchestrator.
pub struct Pipeline {
    discovery: Discovery,
    deep_dive: DeepDive,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        llm: Arc<dyn LanguageModel>,
        config: PipelineConfig,
    ) -> Self {
        let discovery = Discovery::new(searcher.clone(), llm.clone())
            .with_max_candidates(config.max_candidates)
            .with_refine_query(config.refine_query);
        let deep_dive = DeepDive::new(searcher, llm)
            .with_timeout(config.enrichment_timeout)
            .with_fetch_websites(config.fetch_websites)
            .with_max_hits(config.deep_dive_hits);

        Self {
            discovery,
            deep_dive,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    pub fn deep_dive(&self) -> &DeepDive {
        &self.deep_dive
    }

    /// Execute one run, publishing progress to `sink`.
    ///
    /// Returns the summary that was (or would have been) sent with
    /// `RunCompleted`. On discovery failure `RunFailed` is published and the
    /// error returned. On cancellation nothing further is published and
    /// `RunCancelled` is returned.
    pub async fn run<E>(
        &self,
        request: &ScoutRequest,
        sink: &EventSink<E>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary>
    where
        E: StreamEvent + From<ProgressEvent>,
    {
        request.validate()?;

        let mut run = PipelineRun::new(request.search_query());
        let mut machine = StateMachine {
            run_id: run.id,
            state: RunState::Idle,
        };
        let run_id = run.id;
        tracing::info!(%run_id, query = %run.query, "Scout run started");

        machine.advance(RunState::DiscoveryInFlight);
        publish(
            sink,
            ProgressEvent::DiscoveryStarted {
                run_id,
                query: run.query.clone(),
            },
        )?;

        let discovered = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _ = sink.closed() => None,
            result = self.discovery.discover(request) => Some(result),
        };

        let candidates = match discovered {
            None => return Err(cancelled(&mut machine)),
            Some(Err(e)) => {
                machine.advance(RunState::DiscoveryFailed);
                tracing::error!(%run_id, error = %e, "Discovery failed");
                publish(
                    sink,
                    ProgressEvent::RunFailed {
                        run_id,
                        code: e.code().to_string(),
                        error: e.to_string(),
                    },
                )?;
                return Err(e);
            }
            Some(Ok(candidates)) => candidates,
        };

        run.candidates = candidates;
        publish(
            sink,
            ProgressEvent::DiscoveryCompleted {
                run_id,
                candidates: run.candidates.clone(),
            },
        )?;

        if !run.candidates.is_empty() {
            machine.advance(RunState::EnrichmentInFlight);
            let brief = ResearchBrief::new(request.search_criteria.trim())
                .with_attributes(request.attribute_names());

            if !self.enrich_all(&mut run, &brief, sink, cancel).await? {
                return Err(cancelled(&mut machine));
            }
        }

        debug_assert!(run.is_settled());
        machine.advance(RunState::Completed);
        let summary = run.summarize();
        tracing::info!(
            %run_id,
            candidates = summary.candidates,
            succeeded = summary.succeeded,
            failed = summary.failed,
            dropped_events = sink.dropped(),
            "Scout run completed"
        );

        if sink.emit(ProgressEvent::RunCompleted(summary.clone())).is_err() {
            tracing::debug!(%run_id, "Consumer gone before run_completed");
        }
        Ok(summary)
    }

    /// Deep-dive every candidate. Returns `false` if cancelled part-way.
    async fn enrich_all<E>(
        &self,
        run: &mut PipelineRun,
        brief: &ResearchBrief,
        sink: &EventSink<E>,
        cancel: &CancellationToken,
    ) -> Result<bool>
    where
        E: StreamEvent + From<ProgressEvent>,
    {
        let run_id = run.id;
        let mut in_flight = stream::iter(run.candidates.clone())
            .map(|candidate| self.deep_dive.enrich(candidate, brief))
            .buffer_unordered(self.config.max_concurrency.max(1));

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(false),
                _ = sink.closed() => return Ok(false),
                next = in_flight.next() => next,
            };
            let Some(company) = next else {
                return Ok(true);
            };

            let event = progress_for(run_id, &company);
            if run.record(company) {
                publish(sink, event)?;
            }
        }
    }
}

fn progress_for(run_id: uuid::Uuid, company: &EnrichedCompany) -> ProgressEvent {
    if company.is_ok() {
        ProgressEvent::EnrichmentCompleted {
            run_id,
            company: company.clone(),
        }
    } else {
        ProgressEvent::EnrichmentFailed {
            run_id,
            candidate: company.candidate.clone(),
            error: company.error.clone().unwrap_or_default(),
        }
    }
}

fn cancelled(machine: &mut StateMachine) -> ScoutError {
    machine.advance(RunState::Cancelled);
    tracing::info!(run_id = %machine.run_id, "Scout run cancelled");
    ScoutError::RunCancelled
}

fn publish<E>(sink: &EventSink<E>, event: ProgressEvent) -> Result<()>
where
    E: StreamEvent + From<ProgressEvent>,
{
    sink.emit(event).map_err(|_| ScoutError::RunCancelled)
}
