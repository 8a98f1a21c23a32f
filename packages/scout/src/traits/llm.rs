//! Language model boundary.
//!
//! A single `complete` call either returns free text or, when a schema is
//! supplied, a JSON value matching it. Typed extraction is layered on top
//! with [`extract`].

use async_trait::async_trait;
use openai_client::{strip_code_blocks, StructuredOutput};
use serde_json::Value;

use crate::error::{Result, ScoutError};

/// A system/user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Named JSON schema the model must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

impl OutputSchema {
    /// Strict schema derived from a Rust type.
    pub fn of<T: StructuredOutput>() -> Self {
        Self {
            name: T::output_name(),
            schema: T::strict_schema(),
        }
    }
}

/// What the model returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Structured(Value),
    Text(String),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &Prompt, schema: Option<&OutputSchema>) -> Result<Completion>;
}

/// Ask for a `T` and parse the answer.
///
/// Accepts either a structured completion or text containing JSON (optionally
/// fenced in a code block).
pub async fn extract<T: StructuredOutput>(llm: &dyn LanguageModel, prompt: &Prompt) -> Result<T> {
    let schema = OutputSchema::of::<T>();
    match llm.complete(prompt, Some(&schema)).await? {
        Completion::Structured(value) => {
            serde_json::from_value(value).map_err(|e| ScoutError::Parse(e.to_string()))
        }
        Completion::Text(text) => serde_json::from_str(strip_code_blocks(&text))
            .map_err(|e| ScoutError::Parse(e.to_string())),
    }
}

/// Ask for free text.
pub async fn complete_text(llm: &dyn LanguageModel, prompt: &Prompt) -> Result<String> {
    match llm.complete(prompt, None).await? {
        Completion::Text(text) => Ok(text),
        Completion::Structured(value) => Ok(value.to_string()),
    }
}
