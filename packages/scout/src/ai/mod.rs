//! [`LanguageModel`](crate::LanguageModel) implementations.

pub mod openai;

pub use openai::OpenAiModel;
