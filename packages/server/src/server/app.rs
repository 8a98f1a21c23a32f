//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use linkup_client::LinkupClient;
use openai_client::OpenAIClient;
use scout::{
    ai::OpenAiModel,
    searchers::{LinkupSearcher, RateLimitedSearcher},
    Assistant, LanguageModel, Pipeline, PipelineConfig, WebSearcher,
};
use secrecy::ExposeSecret;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, LlmConfig};
use crate::server::routes::{
    chat_handler, enhance_query_handler, health_handler, linkup_search_handler, root_handler,
    run_scout_handler,
};

/// Upper bound on a single upstream HTTP call.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub pipeline: Arc<Pipeline>,
    pub assistant: Arc<Assistant>,
    pub searcher: Arc<dyn WebSearcher>,
    pub llm: Arc<dyn LanguageModel>,
    /// Per-stream event buffer
    pub event_buffer: usize,
}

impl AxumAppState {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        llm: Arc<dyn LanguageModel>,
        pipeline_config: PipelineConfig,
        event_buffer: usize,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(searcher.clone(), llm.clone(), pipeline_config));
        let assistant = Arc::new(Assistant::new(pipeline.clone(), searcher.clone(), llm.clone()));
        Self {
            pipeline,
            assistant,
            searcher,
            llm,
            event_buffer,
        }
    }

    /// Wire real Linkup and OpenAI/Azure clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut linkup = LinkupClient::new(config.linkup_api_key.expose_secret())
            .with_timeout(UPSTREAM_TIMEOUT)
            .context("Failed to build Linkup client")?;
        if let Some(base_url) = &config.linkup_base_url {
            linkup = linkup.with_base_url(base_url);
        }
        let linkup = LinkupSearcher::new(linkup);

        let searcher: Arc<dyn WebSearcher> = match config.search_rps {
            Some(rps) => {
                tracing::info!(rps = rps.get(), "Search rate limit enabled");
                Arc::new(RateLimitedSearcher::new(linkup, rps))
            }
            None => Arc::new(linkup),
        };

        let llm: Arc<dyn LanguageModel> = match &config.llm {
            LlmConfig::Azure {
                api_key,
                endpoint,
                deployment,
                api_version,
            } => {
                tracing::info!(%endpoint, %deployment, "Using Azure OpenAI");
                let mut client = OpenAIClient::azure(api_key.expose_secret(), endpoint, deployment);
                if let Some(version) = api_version {
                    client = client.with_api_version(version);
                }
                let client = client
                    .with_timeout(UPSTREAM_TIMEOUT)
                    .context("Failed to build OpenAI client")?;
                Arc::new(OpenAiModel::new(client, deployment.clone()))
            }
            LlmConfig::OpenAI {
                api_key,
                model,
                base_url,
            } => {
                tracing::info!(%model, "Using OpenAI");
                let mut client = OpenAIClient::new(api_key.expose_secret());
                if let Some(base_url) = base_url {
                    client = client.with_base_url(base_url);
                }
                let client = client
                    .with_timeout(UPSTREAM_TIMEOUT)
                    .context("Failed to build OpenAI client")?;
                Arc::new(OpenAiModel::new(client, model.clone()))
            }
        };

        Ok(Self::new(
            searcher,
            llm,
            config.pipeline_config(),
            config.event_buffer,
        ))
    }
}

/// Build the Axum application router
///
/// An empty `allowed_origins` list allows any origin.
pub fn build_app(state: AxumAppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);
    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/run_scout", post(run_scout_handler))
        .route("/run_startup_finder", post(run_scout_handler))
        .route("/chat", post(chat_handler))
        .route("/enhance_query", post(enhance_query_handler))
        .route("/linkup_search", post(linkup_search_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
