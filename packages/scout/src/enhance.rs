//! Search query enhancement.

use indexmap::IndexSet;

use crate::traits::llm::{complete_text, LanguageModel, Prompt};

const ENHANCE_SYSTEM: &str = "You are an assistant that refines investment search queries.";
const ENHANCE_SUFFIX: &str = "Include funding stage, location, technology tags";
const MAX_KEYWORDS: usize = 12;
const LEADING_WORDS: usize = 6;

const SYNONYMS: &[(&str, &[&str])] = &[
    ("infra", &["infrastructure", "platform", "stack"]),
    ("crypto", &["blockchain", "web3", "cryptocurrency"]),
    ("healthcare", &["health tech", "medtech", "digital health"]),
    ("ai", &["artificial intelligence", "machine learning", "ml"]),
];

/// Rewrite `text` into a richer search query.
///
/// Uses the model when it answers; otherwise falls back to [`simple_enhance`].
pub async fn enhance_query(llm: &dyn LanguageModel, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let prompt = Prompt::new(
        ENHANCE_SYSTEM,
        format!("Refine and expand this search criteria: {text}"),
    );
    match complete_text(llm, &prompt).await {
        Ok(refined) if !refined.trim().is_empty() => refined.trim().to_string(),
        Ok(_) => simple_enhance(text),
        Err(e) => {
            tracing::warn!(error = %e, "Query enhancement failed, using keyword expansion");
            simple_enhance(text)
        }
    }
}

/// Deterministic keyword expansion.
///
/// Keeps the first six words longer than two characters, adds synonyms for
/// known sector terms, and caps the keyword list at twelve.
pub fn simple_enhance(text: &str) -> String {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c| matches!(c, '.' | ',' | '(' | ')')))
        .filter(|w| !w.is_empty())
        .collect();

    let mut keywords: IndexSet<String> = tokens
        .iter()
        .filter(|w| w.chars().count() > 2)
        .take(LEADING_WORDS)
        .map(|w| w.to_string())
        .collect();

    for token in &tokens {
        let lower = token.to_lowercase();
        if let Some((_, synonyms)) = SYNONYMS.iter().find(|(key, _)| *key == lower) {
            keywords.extend(synonyms.iter().map(|s| s.to_string()));
        }
    }

    let keywords: Vec<String> = keywords.into_iter().take(MAX_KEYWORDS).collect();
    format!(
        "{} | Keywords: {} | {}",
        text.trim(),
        keywords.join(", "),
        ENHANCE_SUFFIX
    )
}
