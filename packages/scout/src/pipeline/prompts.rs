//! LLM prompts for Discovery and Deep-Dive.
//!
//! Templates use `{placeholder}` markers filled by the `format_*` helpers.

use openai_client::truncate_to_char_boundary;

use crate::traits::{llm::Prompt, searcher::SearchHit};
use crate::types::{candidate::Candidate, request::ScoutRequest};

/// Characters of fetched homepage markdown included in a deep-dive prompt.
pub const WEBSITE_MAX_BYTES: usize = 3000;

pub const ANALYST_SYSTEM: &str = "You are a venture capital analyst. You only report facts that \
appear in the supplied sources. When a fact is not present, leave the field empty.";

pub const REFINE_QUERY_PROMPT: &str = r#"Rewrite this startup search into one precise web search query.
Keep every constraint (sector, geography, stage). Return only the query, no quotes.

Search: {query}"#;

pub const DISCOVERY_PROMPT: &str = r#"From the search results below, list startups that match the investment criteria.

Criteria: {criteria}
Location: {location}
Funding stage: {funding_stage}

Rules:
- Only include operating companies, not articles, investors, or lists.
- Use the company's own website as url (https://...).
- country is where the company is headquartered; use "Unknown" if not stated.

Search results:
{results}"#;

pub const DEEP_DIVE_PROMPT: &str = r#"Research this company for an investor.

Company: {name}
Website: {url}
Country: {country}
Investment thesis: {thesis}

Fill in:
- description: one or two sentences on what the company does
- founded_year: four-digit year
- funding_stage: latest round (Pre-seed, Seed, Series A, ...)
- arr: annual recurring revenue if disclosed
- market_sector: primary sector
- competitors: names of direct competitors
- attributes: one entry per requested attribute, value empty if unknown
{attributes}

Search results:
{results}

Website content:
{website}"#;

pub fn format_refine_prompt(query: &str) -> Prompt {
    Prompt::new(ANALYST_SYSTEM, REFINE_QUERY_PROMPT.replace("{query}", query))
}

pub fn format_discovery_prompt(request: &ScoutRequest, hits: &[SearchHit]) -> Prompt {
    let user = DISCOVERY_PROMPT
        .replace("{criteria}", request.search_criteria.trim())
        .replace("{location}", request.location().unwrap_or("any"))
        .replace("{funding_stage}", request.funding_stage().unwrap_or("any"))
        .replace("{results}", &format_search_results(hits));
    Prompt::new(ANALYST_SYSTEM, user)
}

pub fn format_deep_dive_prompt(
    candidate: &Candidate,
    thesis: &str,
    attributes: &[String],
    hits: &[SearchHit],
    website: Option<&str>,
) -> Prompt {
    let attributes = if attributes.is_empty() {
        String::new()
    } else {
        format!("Requested attributes: {}", attributes.join(", "))
    };
    let website = website
        .map(|md| truncate_to_char_boundary(md, WEBSITE_MAX_BYTES))
        .unwrap_or("(not available)");

    let user = DEEP_DIVE_PROMPT
        .replace("{name}", &candidate.name)
        .replace("{url}", &candidate.url)
        .replace("{country}", &candidate.country)
        .replace("{thesis}", thesis)
        .replace("{attributes}", &attributes)
        .replace("{results}", &format_search_results(hits))
        .replace("{website}", website);
    Prompt::new(ANALYST_SYSTEM, user)
}

/// Numbered `title / url / snippet` blocks.
pub fn format_search_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "(no results)".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {}\n{}\n{}", i + 1, hit.title, hit.url, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_prompt_fills_placeholders() {
        let request = ScoutRequest::new("AI healthcare").with_location("Germany");
        let prompt = format_discovery_prompt(
            &request,
            &[SearchHit::new("Ada", "https://ada.com", "Symptom checker")],
        );
        assert!(prompt.user.contains("Criteria: AI healthcare"));
        assert!(prompt.user.contains("Location: Germany"));
        assert!(prompt.user.contains("Funding stage: any"));
        assert!(prompt.user.contains("[1] Ada\nhttps://ada.com"));
        assert!(!prompt.user.contains('{'));
    }

    #[test]
    fn test_deep_dive_prompt_truncates_website() {
        let candidate = Candidate::new("Ada", "https://ada.com", "DE");
        let page = "x".repeat(WEBSITE_MAX_BYTES * 2);
        let prompt = format_deep_dive_prompt(&candidate, "AI", &["CEO".into()], &[], Some(&page));
        assert!(prompt.user.contains("Requested attributes: CEO"));
        assert!(!prompt.user.contains(&"x".repeat(WEBSITE_MAX_BYTES + 1)));
    }
}
