//! Deep-Dive: research one candidate under a deadline.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;

use super::prompts::format_deep_dive_prompt;
use crate::error::{Result, ScoutError};
use crate::traits::{
    llm::{extract, LanguageModel},
    searcher::WebSearcher,
};
use crate::types::{candidate::Candidate, company::EnrichedCompany};

/// Values the model uses to mean "not found".
const PLACEHOLDERS: &[&str] = &["", "n/a", "na", "unknown", "none", "-", "null", "not available"];

/// LLM answer shape for company research.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompanyProfile {
    pub description: Option<String>,
    pub founded_year: Option<String>,
    pub funding_stage: Option<String>,
    pub arr: Option<String>,
    pub market_sector: Option<String>,
    pub competitors: Vec<String>,
    pub attributes: Vec<AttributeValue>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AttributeValue {
    pub name: String,
    pub value: Option<String>,
}

/// What the caller wants to learn about every candidate.
#[derive(Debug, Clone, Default)]
pub struct ResearchBrief {
    pub thesis: String,
    pub attributes: Vec<String>,
}

impl ResearchBrief {
    pub fn new(thesis: impl Into<String>) -> Self {
        Self {
            thesis: thesis.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

pub struct DeepDive {
    searcher: Arc<dyn WebSearcher>,
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
    fetch_websites: bool,
    max_hits: usize,
}

impl DeepDive {
    pub fn new(searcher: Arc<dyn WebSearcher>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            searcher,
            llm,
            timeout: Duration::from_secs(90),
            fetch_websites: true,
            max_hits: 5,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fetch_websites(mut self, fetch: bool) -> Self {
        self.fetch_websites = fetch;
        self
    }

    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Research `candidate`. Never fails: errors and timeouts produce a
    /// `Failed` record carrying the cause.
    pub async fn enrich(&self, candidate: Candidate, brief: &ResearchBrief) -> EnrichedCompany {
        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.research(&candidate, brief)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(profile)) => {
                tracing::info!(company = %candidate.name, elapsed_ms, "Deep dive completed");
                apply_profile(candidate, profile, &brief.attributes)
            }
            Ok(Err(e)) => {
                tracing::warn!(company = %candidate.name, error = %e, elapsed_ms, "Deep dive failed");
                EnrichedCompany::failed(candidate, e.to_string())
            }
            Err(_) => {
                tracing::warn!(company = %candidate.name, elapsed_ms, "Deep dive timed out");
                EnrichedCompany::failed(candidate, ScoutError::EnrichmentTimeout.to_string())
            }
        }
    }

    async fn research(&self, candidate: &Candidate, brief: &ResearchBrief) -> Result<CompanyProfile> {
        let mut hits = self.searcher.search(&research_query(candidate)).await?;
        hits.truncate(self.max_hits);

        let website = if self.fetch_websites && candidate.has_web_url() {
            match self.searcher.fetch_page(&candidate.url).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::debug!(url = %candidate.url, error = %e, "Website fetch failed");
                    None
                }
            }
        } else {
            None
        };

        let prompt = format_deep_dive_prompt(
            candidate,
            &brief.thesis,
            &brief.attributes,
            &hits,
            website.as_deref(),
        );
        extract::<CompanyProfile>(self.llm.as_ref(), &prompt).await
    }
}

/// `"{name} {host} startup funding founders competitors"`.
pub fn research_query(candidate: &Candidate) -> String {
    match candidate.host() {
        Some(host) => format!("{} {} startup funding founders competitors", candidate.name, host),
        None => format!("{} startup funding founders competitors", candidate.name),
    }
}

/// Merge a model answer into a record, discarding placeholder values.
pub fn apply_profile(
    candidate: Candidate,
    profile: CompanyProfile,
    requested: &[String],
) -> EnrichedCompany {
    let mut company = EnrichedCompany::ok(candidate);
    company.description = clean(profile.description);
    company.founded_year = parse_year(profile.founded_year.as_deref());
    company.funding_stage = clean(profile.funding_stage);
    company.arr = clean(profile.arr);
    company.market_sector = clean(profile.market_sector);
    company.competitors = profile
        .competitors
        .into_iter()
        .filter_map(|c| clean(Some(c)))
        .filter(|c| !c.eq_ignore_ascii_case(&company.candidate.name))
        .collect();

    for attr in profile.attributes {
        let Some(name) = requested
            .iter()
            .find(|r| r.eq_ignore_ascii_case(attr.name.trim()))
        else {
            continue;
        };
        if let Some(value) = clean(attr.value) {
            company.attributes.insert(name.clone(), value);
        }
    }
    company
}

fn clean(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p)) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First plausible four-digit year in the text.
fn parse_year(value: Option<&str>) -> Option<u16> {
    let value = value?;
    let bytes = value.as_bytes();
    (0..bytes.len().saturating_sub(3))
        .filter(|&i| bytes[i..i + 4].iter().all(u8::is_ascii_digit))
        .filter(|&i| i == 0 || !bytes[i - 1].is_ascii_digit())
        .filter(|&i| i + 4 == bytes.len() || !bytes[i + 4].is_ascii_digit())
        .filter_map(|i| value[i..i + 4].parse::<u16>().ok())
        .find(|year| (1800..=2100).contains(year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLanguageModel, MockReply, MockWebSearcher, SearchCall};
    use crate::traits::searcher::SearchHit;
    use crate::types::company::EnrichmentStatus;
    use serde_json::json;

    fn acme() -> Candidate {
        Candidate::new("Acme", "https://www.acme.com/", "DE")
    }

    fn profile_json() -> serde_json::Value {
        json!({
            "description": "Reusable rockets",
            "founded_year": "Founded in 2016",
            "funding_stage": "N/A",
            "arr": "",
            "market_sector": "Space",
            "competitors": ["Beta Rockets", "unknown", "Acme"],
            "attributes": [
                { "name": "ceo", "value": "Jane Doe" },
                { "name": "Headcount", "value": "none" },
                { "name": "Unrequested", "value": "x" }
            ]
        })
    }

    #[test]
    fn test_research_query_uses_host() {
        assert_eq!(
            research_query(&acme()),
            "Acme acme.com startup funding founders competitors"
        );
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(Some("2016")), Some(2016));
        assert_eq!(parse_year(Some("Founded in 1999.")), Some(1999));
        assert_eq!(parse_year(Some("12345")), None);
        assert_eq!(parse_year(Some("unknown")), None);
        assert_eq!(parse_year(None), None);
    }

    #[tokio::test]
    async fn test_enrich_normalizes_placeholders() {
        let searcher = MockWebSearcher::new()
            .with_hits("Acme", vec![SearchHit::new("Acme raises", "https://news.com", "Seed")])
            .with_page("https://www.acme.com/", "# Acme\nWe build rockets");
        let llm = MockLanguageModel::new().on_schema("CompanyProfile", MockReply::json(profile_json()));
        let deep_dive = DeepDive::new(Arc::new(searcher), Arc::new(llm));

        let brief = ResearchBrief::new("space").with_attributes(vec!["CEO".into(), "Headcount".into()]);
        let company = deep_dive.enrich(acme(), &brief).await;

        assert_eq!(company.status, EnrichmentStatus::Ok);
        assert_eq!(company.description.as_deref(), Some("Reusable rockets"));
        assert_eq!(company.founded_year, Some(2016));
        assert_eq!(company.funding_stage, None);
        assert_eq!(company.arr, None);
        assert_eq!(company.competitors, vec!["Beta Rockets"]);
        assert_eq!(company.attributes.get("CEO").map(String::as_str), Some("Jane Doe"));
        assert!(!company.attributes.contains_key("Headcount"));
        assert_eq!(company.attributes.len(), 1);
    }

    #[tokio::test]
    async fn test_website_goes_into_prompt() {
        let searcher = Arc::new(MockWebSearcher::new().with_page("https://www.acme.com/", "We build rockets"));
        let llm = Arc::new(
            MockLanguageModel::new().on_schema("CompanyProfile", MockReply::json(profile_json())),
        );
        let deep_dive = DeepDive::new(searcher.clone(), llm.clone());

        deep_dive.enrich(acme(), &ResearchBrief::new("space")).await;

        assert!(searcher.calls().contains(&SearchCall::Fetch {
            url: "https://www.acme.com/".into()
        }));
        assert!(llm.calls()[0].prompt.user.contains("We build rockets"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_failed_record() {
        let llm = MockLanguageModel::new().on_schema(
            "CompanyProfile",
            MockReply::json(profile_json()).after(Duration::from_secs(120)),
        );
        let deep_dive = DeepDive::new(Arc::new(MockWebSearcher::new()), Arc::new(llm))
            .with_timeout(Duration::from_secs(1));

        let company = deep_dive.enrich(acme(), &ResearchBrief::default()).await;

        assert_eq!(company.status, EnrichmentStatus::Failed);
        assert_eq!(company.error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_search_failure_yields_failed_record() {
        let searcher = MockWebSearcher::new().unavailable();
        let deep_dive = DeepDive::new(Arc::new(searcher), Arc::new(MockLanguageModel::new()));

        let company = deep_dive.enrich(acme(), &ResearchBrief::default()).await;

        assert!(!company.is_ok());
        assert!(company.error.unwrap().contains("search unavailable"));
    }
}
