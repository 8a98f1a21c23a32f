//! Conversational front end over the pipeline.
//!
//! Each chat message is classified once and dispatched to exactly one
//! handler. Handlers reuse Discovery, Deep-Dive and web search; none of them
//! calls back into the model to decide what to do next.

pub mod intent;
pub mod render;

pub use intent::{classify, ChatTurn, Intent, IntentKind};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ScoutError};
use crate::events::ChatEvent;
use crate::pipeline::{Pipeline, ResearchBrief};
use crate::publisher::EventSink;
use crate::traits::{llm::LanguageModel, searcher::WebSearcher};
use crate::types::{candidate::Candidate, company::EnrichedCompany, request::ScoutRequest};

/// Body of a chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

/// Handler output before it is published.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatAnswer {
    pub intent: IntentKind,
    pub response: String,
    pub companies: Vec<EnrichedCompany>,
}

pub struct Assistant {
    pipeline: Arc<Pipeline>,
    searcher: Arc<dyn WebSearcher>,
    llm: Arc<dyn LanguageModel>,
}

impl Assistant {
    pub fn new(
        pipeline: Arc<Pipeline>,
        searcher: Arc<dyn WebSearcher>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            pipeline,
            searcher,
            llm,
        }
    }

    /// Answer one chat message, streaming status and progress to `sink`.
    ///
    /// Always finishes with `complete` or `error` unless cancelled.
    pub async fn respond(
        &self,
        input: &ChatInput,
        sink: &EventSink<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let message = input.message.trim();
        if message.is_empty() {
            let error = ScoutError::InvalidRequest("message must not be empty".into());
            emit(sink, ChatEvent::Error { message: error.to_string() })?;
            return Err(error);
        }

        emit(sink, ChatEvent::status("Understanding your request..."))?;
        let intent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScoutError::RunCancelled),
            intent = classify(self.llm.as_ref(), message, &input.conversation_history) => intent,
        };
        tracing::info!(intent = ?intent.kind(), "Dispatching chat message");

        match self.dispatch(intent, sink, cancel).await {
            Ok(answer) => {
                emit(
                    sink,
                    ChatEvent::Complete {
                        intent: answer.intent,
                        response: answer.response,
                        companies: answer.companies,
                    },
                )
            }
            Err(ScoutError::RunCancelled) => Err(ScoutError::RunCancelled),
            Err(e) => {
                tracing::warn!(error = %e, "Chat handler failed");
                emit(sink, ChatEvent::Error { message: e.to_string() })?;
                Err(e)
            }
        }
    }

    async fn dispatch(
        &self,
        intent: Intent,
        sink: &EventSink<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<ChatAnswer> {
        let kind = intent.kind();
        let (response, companies) = match intent {
            Intent::FindStartups { thesis } => {
                emit(sink, ChatEvent::status(format!("Searching for startups: {thesis}")))?;
                let summary = self
                    .pipeline
                    .run(&ScoutRequest::new(thesis), sink, cancel)
                    .await?;
                companies_answer(summary.results, "I could not find startups matching that thesis.")
            }
            Intent::ResearchCompany { company } => {
                emit(sink, ChatEvent::status(format!("Researching {company}...")))?;
                let result = self.research_company(&company, cancel).await?;
                companies_answer(vec![result], "")
            }
            Intent::ResearchCompetitors { company, sector } => {
                emit(sink, ChatEvent::status(format!("Mapping competitors of {company}...")))?;
                let criteria = match &sector {
                    Some(sector) => format!("startups competing with {company} in {sector}"),
                    None => format!("startups competing with {company}"),
                };
                let summary = self
                    .pipeline
                    .run(&ScoutRequest::new(criteria), sink, cancel)
                    .await?;
                let rivals: Vec<EnrichedCompany> = summary
                    .results
                    .into_iter()
                    .filter(|c| !c.name().eq_ignore_ascii_case(&company))
                    .collect();
                companies_answer(rivals, "I could not find competitors for that company.")
            }
            Intent::WebSearch { query } => {
                emit(sink, ChatEvent::status("Searching the web..."))?;
                let hits = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ScoutError::RunCancelled),
                    hits = self.searcher.search(&query) => hits?,
                };
                let response = if hits.is_empty() {
                    "No results found.".to_string()
                } else {
                    render::render_hits(&hits)
                };
                (response, Vec::new())
            }
            Intent::SmallTalk { reply } => (reply, Vec::new()),
        };

        Ok(ChatAnswer {
            intent: kind,
            response,
            companies,
        })
    }

    /// Resolve a company name to its website, then deep-dive it.
    async fn research_company(
        &self,
        company: &str,
        cancel: &CancellationToken,
    ) -> Result<EnrichedCompany> {
        let work = async {
            let hits = self
                .searcher
                .search(&format!("{company} official website"))
                .await?;
            let url = hits.first().map(|h| h.url.clone()).unwrap_or_default();

            let candidate = Candidate::new(company, url, "Unknown");
            let brief = ResearchBrief::new(format!("Company profile of {company}"));
            Ok::<_, ScoutError>(self.pipeline.deep_dive().enrich(candidate, &brief).await)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScoutError::RunCancelled),
            result = work => result,
        }
    }
}

fn companies_answer(companies: Vec<EnrichedCompany>, empty: &str) -> (String, Vec<EnrichedCompany>) {
    if companies.is_empty() {
        (empty.to_string(), companies)
    } else {
        (render::render_companies(&companies), companies)
    }
}

fn emit(sink: &EventSink<ChatEvent>, event: ChatEvent) -> Result<()> {
    sink.emit(event).map_err(|_| ScoutError::RunCancelled)
}
