//! Intent classification for chat messages.
//!
//! One structured LLM call picks the intent and pulls out its subject. When
//! that call fails, a keyword heuristic decides between discovery and small
//! talk so the chat endpoint always answers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::traits::llm::{extract, LanguageModel, Prompt};

pub const CLASSIFY_SYSTEM: &str = r#"You route messages for a startup research assistant used by investors.

Pick exactly one intent:
- find_startups: discover startups matching a thesis ("find AI startups in Berlin")
- research_company: learn about one named company ("tell me about Mistral")
- research_competitors: competitors or alternatives of a company ("who competes with Stripe?")
- web_search: a factual question needing a web lookup that is not about finding startups
- small_talk: greetings, thanks, or questions about the assistant itself

subject: the thesis, company name, or search query. Empty for small_talk.
market_sector: the company's sector for research_competitors, if stated.
reply: a short friendly answer for small_talk, otherwise empty."#;

pub const DEFAULT_REPLY: &str = "I can find startups that match an investment thesis, research a \
specific company, or map its competitors. What would you like to look into?";

/// Serialized intent name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    FindStartups,
    ResearchCompany,
    ResearchCompetitors,
    WebSearch,
    SmallTalk,
}

/// LLM answer shape for routing.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IntentClassification {
    pub intent: IntentKind,
    pub subject: Option<String>,
    pub market_sector: Option<String>,
    pub reply: Option<String>,
}

/// A routed chat message with everything its handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    FindStartups { thesis: String },
    ResearchCompany { company: String },
    ResearchCompetitors { company: String, sector: Option<String> },
    WebSearch { query: String },
    SmallTalk { reply: String },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::FindStartups { .. } => IntentKind::FindStartups,
            Self::ResearchCompany { .. } => IntentKind::ResearchCompany,
            Self::ResearchCompetitors { .. } => IntentKind::ResearchCompetitors,
            Self::WebSearch { .. } => IntentKind::WebSearch,
            Self::SmallTalk { .. } => IntentKind::SmallTalk,
        }
    }

    /// Build from a classification, falling back to the raw message when
    /// the subject is missing.
    pub fn from_classification(c: IntentClassification, message: &str) -> Self {
        let subject = non_empty(c.subject).unwrap_or_else(|| message.trim().to_string());
        match c.intent {
            IntentKind::FindStartups => Self::FindStartups { thesis: subject },
            IntentKind::ResearchCompany => Self::ResearchCompany { company: subject },
            IntentKind::ResearchCompetitors => Self::ResearchCompetitors {
                company: subject,
                sector: non_empty(c.market_sector),
            },
            IntentKind::WebSearch => Self::WebSearch { query: subject },
            IntentKind::SmallTalk => Self::SmallTalk {
                reply: non_empty(c.reply).unwrap_or_else(|| DEFAULT_REPLY.to_string()),
            },
        }
    }

    /// Keyword routing used when classification is unavailable.
    pub fn heuristic(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["startup", "compan", "find ", "discover", "search for", "scout"]) {
            Self::FindStartups {
                thesis: message.trim().to_string(),
            }
        } else {
            Self::SmallTalk {
                reply: DEFAULT_REPLY.to_string(),
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A prior chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Route `message`, using recent history for context.
pub async fn classify(llm: &dyn LanguageModel, message: &str, history: &[ChatTurn]) -> Intent {
    let prompt = Prompt::new(CLASSIFY_SYSTEM, format_classify_input(message, history));
    match extract::<IntentClassification>(llm, &prompt).await {
        Ok(c) => {
            let intent = Intent::from_classification(c, message);
            tracing::debug!(intent = ?intent.kind(), "Classified chat message");
            intent
        }
        Err(e) => {
            let intent = Intent::heuristic(message);
            tracing::warn!(error = %e, intent = ?intent.kind(), "Classification failed, using heuristic");
            intent
        }
    }
}

/// Last few turns of history followed by the new message.
fn format_classify_input(message: &str, history: &[ChatTurn]) -> String {
    const MAX_TURNS: usize = 6;
    let recent = &history[history.len().saturating_sub(MAX_TURNS)..];

    let mut out = String::new();
    if !recent.is_empty() {
        out.push_str("Conversation so far:\n");
        for turn in recent {
            out.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
        out.push('\n');
    }
    out.push_str("Message: ");
    out.push_str(message.trim());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLanguageModel, MockReply};
    use crate::ScoutError;
    use serde_json::json;

    #[test]
    fn test_heuristic_routes_discovery() {
        assert_eq!(
            Intent::heuristic("Find fintech startups in Lagos").kind(),
            IntentKind::FindStartups
        );
        assert_eq!(Intent::heuristic("hello!").kind(), IntentKind::SmallTalk);
    }

    #[test]
    fn test_missing_subject_uses_message() {
        let intent = Intent::from_classification(
            IntentClassification {
                intent: IntentKind::ResearchCompetitors,
                subject: Some("  ".into()),
                market_sector: Some("payments".into()),
                reply: None,
            },
            "who competes with Stripe?",
        );
        assert_eq!(
            intent,
            Intent::ResearchCompetitors {
                company: "who competes with Stripe?".into(),
                sector: Some("payments".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_classify_uses_model_answer() {
        let llm = MockLanguageModel::new().on_schema(
            "IntentClassification",
            MockReply::json(json!({
                "intent": "research_company",
                "subject": "Mistral AI",
                "market_sector": null,
                "reply": null
            })),
        );

        let intent = classify(&llm, "tell me about Mistral", &[]).await;
        assert_eq!(intent, Intent::ResearchCompany { company: "Mistral AI".into() });
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_failure() {
        let llm = MockLanguageModel::new().on_schema(
            "IntentClassification",
            MockReply::fail(ScoutError::LlmRateLimited { attempts: 4 }),
        );

        let intent = classify(&llm, "find climate startups", &[]).await;
        assert_eq!(intent.kind(), IntentKind::FindStartups);
    }

    #[test]
    fn test_history_is_trimmed() {
        let history: Vec<ChatTurn> = (0..10)
            .map(|i| ChatTurn {
                role: "user".into(),
                content: format!("turn {i}"),
            })
            .collect();
        let input = format_classify_input("next", &history);
        assert!(!input.contains("turn 3"));
        assert!(input.contains("turn 4"));
        assert!(input.ends_with("Message: next"));
    }
}
