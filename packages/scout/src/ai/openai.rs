//! OpenAI / Azure OpenAI implementation of the LanguageModel trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::OpenAIClient;
//! use scout::ai::OpenAiModel;
//!
//! let llm = OpenAiModel::new(OpenAIClient::from_env()?, "gpt-4o-mini");
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError, StructuredRequest};

use crate::error::{Result, ScoutError};
use crate::retry::{RetryError, RetryPolicy};
use crate::traits::llm::{Completion, LanguageModel, OutputSchema, Prompt};

/// Chat-completions backed model with client-side retry.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: OpenAIClient,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAiModel {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.3,
            retry: RetryPolicy::default(),
        }
    }

    /// Temperature for free-text completions. Structured calls always use 0.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, prompt: &Prompt, schema: Option<&OutputSchema>) -> Result<Completion> {
        match schema {
            Some(schema) => {
                let request = StructuredRequest::new(
                    &self.model,
                    &prompt.system,
                    &prompt.user,
                    &schema.name,
                    schema.schema.clone(),
                );
                let raw = self
                    .retry
                    .run("llm_structured", || self.client.structured_output(request.clone()))
                    .await
                    .map_err(llm_error)?;

                let value = serde_json::from_str(&raw).map_err(|e| ScoutError::Parse(e.to_string()))?;
                tracing::debug!(schema = %schema.name, "Structured completion");
                Ok(Completion::Structured(value))
            }
            None => {
                let request = ChatRequest::new(&self.model)
                    .message(Message::system(&prompt.system))
                    .message(Message::user(&prompt.user))
                    .temperature(self.temperature);
                let response = self
                    .retry
                    .run("llm_chat", || self.client.chat_completion(request.clone()))
                    .await
                    .map_err(llm_error)?;

                Ok(Completion::Text(response.content))
            }
        }
    }
}

fn llm_error(err: RetryError<OpenAIError>) -> ScoutError {
    match err.error {
        OpenAIError::RateLimited { .. } => ScoutError::LlmRateLimited {
            attempts: err.attempts,
        },
        OpenAIError::Parse(message) => ScoutError::Parse(message),
        other => ScoutError::LlmUnavailable(other.to_string()),
    }
}
