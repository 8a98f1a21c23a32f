//! Pure OpenAI REST API client
//!
//! A minimal client for chat completions against either api.openai.com (or any
//! compatible base URL) or an Azure OpenAI deployment. No domain logic lives here.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::new("sk-...");
//!
//! let response = client
//!     .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("Hello!")))
//!     .await?;
//! ```
//!
//! # Type-Safe Structured Output
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct Companies {
//!     companies: Vec<Company>,
//! }
//!
//! let found: Companies = client
//!     .extract::<Companies>("gpt-4o-mini", system_prompt, user_prompt)
//!     .await?;
//! ```
//!
//! # Azure
//!
//! ```rust,ignore
//! let client = OpenAIClient::azure(key, "https://my-resource.openai.azure.com", "gpt-4o")
//!     .with_api_version("2024-08-01-preview");
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Where requests are sent and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    /// OpenAI-compatible API, `Authorization: Bearer` auth.
    OpenAI { base_url: String },

    /// Azure OpenAI deployment, `api-key` header auth.
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: Arc<SecretString>,
    endpoint: Endpoint,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a client for api.openai.com.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: Arc::new(SecretString::from(api_key.into())),
            endpoint: Endpoint::OpenAI {
                base_url: DEFAULT_BASE_URL.to_string(),
            },
        }
    }

    /// Create a client for an Azure OpenAI deployment.
    pub fn azure(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            http_client: Client::new(),
            api_key: Arc::new(SecretString::from(api_key.into())),
            endpoint: Endpoint::Azure {
                endpoint: endpoint.into().trim_end_matches('/').to_string(),
                deployment: deployment.into(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (proxies, compatible gateways, tests).
    /// No-op for Azure clients.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let Endpoint::OpenAI { base_url } = &mut self.endpoint {
            *base_url = url.into().trim_end_matches('/').to_string();
        }
        self
    }

    /// Set the Azure `api-version` query parameter. No-op for non-Azure clients.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        if let Endpoint::Azure { api_version, .. } = &mut self.endpoint {
            *api_version = version.into();
        }
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(e.to_string()))?;
        Ok(self)
    }

    fn completions_url(&self) -> String {
        match &self.endpoint {
            Endpoint::OpenAI { base_url } => format!("{}/chat/completions", base_url),
            Endpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, deployment, api_version
            ),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        match &self.endpoint {
            Endpoint::OpenAI { .. } => request.header(header::AUTHORIZATION, format!("Bearer {}", key)),
            Endpoint::Azure { .. } => request.header("api-key", key),
        }
    }

    /// Type-safe structured output extraction.
    ///
    /// Generates a strict JSON schema from `T`, sends it with the prompts and
    /// deserializes the reply.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = StructuredRequest::new(
            model,
            system_prompt,
            user_prompt,
            T::output_name(),
            T::strict_schema(),
        );
        let json_str = self.structured_output(request).await?;

        serde_json::from_str(&json_str)
            .map_err(|e| OpenAIError::Parse(format!("Failed to deserialize response: {}", e)))
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let raw = self.post_completion(&request).await?;
        let usage = raw.usage.clone();
        let content = first_content(raw)?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI chat completion"
        );

        Ok(ChatResponse { content, usage })
    }

    /// Structured output with JSON schema. Returns the raw JSON text.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String> {
        let start = std::time::Instant::now();
        let raw = self.post_completion(&request).await?;
        let content = first_content(raw)?;

        debug!(
            model = %request.model,
            schema = %request.response_format.json_schema.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI structured output"
        );

        Ok(content)
    }

    async fn post_completion<B: Serialize>(&self, body: &B) -> Result<types::ChatResponseRaw> {
        let request = self
            .http_client
            .post(self.completions_url())
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);

        let response = self.authorize(request).send().await.map_err(|e| {
            warn!(error = %e, "OpenAI request failed");
            OpenAIError::Network(e.to_string())
        })?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}

fn first_content(raw: types::ChatResponseRaw) -> Result<String> {
    let message = raw
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| OpenAIError::Parse("No choices in OpenAI response".into()))?;

    match (message.content, message.refusal) {
        (Some(content), _) => Ok(content),
        (None, Some(refusal)) => Err(OpenAIError::Api {
            status: 200,
            message: format!("model refused: {}", refusal),
        }),
        (None, None) => Err(OpenAIError::Parse("Empty message content".into())),
    }
}

/// Map non-2xx responses onto the error taxonomy.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, error = %body, "OpenAI API error");

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => OpenAIError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OpenAIError::Auth(body),
        _ => OpenAIError::Api {
            status: status.as_u16(),
            message: body,
        },
    })
}
