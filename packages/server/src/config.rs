use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use scout::PipelineConfig;
use secrecy::SecretString;

/// Which chat-completions backend to talk to.
#[derive(Debug)]
pub enum LlmConfig {
    Azure {
        api_key: SecretString,
        endpoint: String,
        deployment: String,
        api_version: Option<String>,
    },
    OpenAI {
        api_key: SecretString,
        model: String,
        base_url: Option<String>,
    },
}

/// Application configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub linkup_api_key: SecretString,
    pub linkup_base_url: Option<String>,
    pub llm: LlmConfig,
    pub max_concurrency: usize,
    pub max_candidates: usize,
    pub enrichment_timeout: Duration,
    pub event_buffer: usize,
    pub refine_query: bool,
    pub search_rps: Option<NonZeroU32>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let linkup_api_key = var("LINKUP_API_KEY").context("LINKUP_API_KEY must be set")?;

        let llm = match (
            var("AZURE_OPENAI_KEY"),
            var("AZURE_OPENAI_ENDPOINT"),
            var("AZURE_OPENAI_DEPLOYMENT_NAME"),
        ) {
            (Some(api_key), Some(endpoint), Some(deployment)) => LlmConfig::Azure {
                api_key: SecretString::from(api_key),
                endpoint,
                deployment,
                api_version: var("OPENAI_API_VERSION"),
            },
            _ => match var("OPENAI_API_KEY") {
                Some(api_key) => LlmConfig::OpenAI {
                    api_key: SecretString::from(api_key),
                    model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                    base_url: var("OPENAI_BASE_URL"),
                },
                None => bail!(
                    "either AZURE_OPENAI_KEY/AZURE_OPENAI_ENDPOINT/AZURE_OPENAI_DEPLOYMENT_NAME \
                     or OPENAI_API_KEY must be set"
                ),
            },
        };

        let search_rps = match var("SCOUT_SEARCH_RPS") {
            Some(v) => Some(
                v.parse::<NonZeroU32>()
                    .context("SCOUT_SEARCH_RPS must be a positive number")?,
            ),
            None => None,
        };

        Ok(Self {
            port: parse_or(&var, "PORT", 8000)?,
            linkup_api_key: SecretString::from(linkup_api_key),
            linkup_base_url: var("LINKUP_BASE_URL"),
            llm,
            max_concurrency: parse_or(&var, "SCOUT_MAX_CONCURRENCY", 3usize)?.max(1),
            max_candidates: parse_or(&var, "SCOUT_MAX_CANDIDATES", 10)?,
            enrichment_timeout: Duration::from_secs(parse_or(
                &var,
                "SCOUT_ENRICHMENT_TIMEOUT_SECS",
                90,
            )?),
            event_buffer: parse_or(&var, "SCOUT_EVENT_BUFFER", 64usize)?.max(1),
            refine_query: parse_or(&var, "SCOUT_REFINE_QUERY", false)?,
            search_rps,
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_max_concurrency(self.max_concurrency)
            .with_max_candidates(self.max_candidates)
            .with_enrichment_timeout(self.enrichment_timeout)
            .with_refine_query(self.refine_query)
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match var(key) {
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid value, got {v:?}")),
        None => Ok(default),
    }
}
