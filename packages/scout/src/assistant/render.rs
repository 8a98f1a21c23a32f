//! Markdown rendering of chat answers.

use crate::traits::searcher::SearchHit;
use crate::types::company::EnrichedCompany;

/// Numbered company list with indented details.
pub fn render_companies(companies: &[EnrichedCompany]) -> String {
    companies
        .iter()
        .enumerate()
        .map(|(i, c)| render_company(i + 1, c))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_company(n: usize, c: &EnrichedCompany) -> String {
    let mut out = format!("{n}. **{}**\n   - Website: {}", c.candidate.name, c.candidate.url);
    if !c.is_ok() {
        out.push_str(&format!(
            "\n   - Research failed: {}",
            c.error.as_deref().unwrap_or("unknown error")
        ));
        return out;
    }

    let or_unknown = |v: Option<&str>| v.unwrap_or("Unknown").to_string();
    out.push_str(&format!("\n   - Description: {}", or_unknown(c.description.as_deref())));
    out.push_str(&format!(
        "\n   - Founded: {}",
        c.founded_year.map(|y| y.to_string()).unwrap_or_else(|| "Unknown".into())
    ));
    out.push_str(&format!("\n   - Market Sector: {}", or_unknown(c.market_sector.as_deref())));
    if let Some(stage) = &c.funding_stage {
        out.push_str(&format!("\n   - Funding Stage: {stage}"));
    }
    for (name, value) in &c.attributes {
        out.push_str(&format!("\n   - {name}: {value}"));
    }
    out
}

/// Bulleted search results.
pub fn render_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| format!("- [{}]({}): {}", h.title, h.url, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::candidate::Candidate;

    #[test]
    fn test_renders_numbered_list() {
        let mut ok = EnrichedCompany::ok(Candidate::new("Acme", "https://acme.com", "DE"));
        ok.description = Some("Rockets".into());
        ok.founded_year = Some(2016);
        let failed = EnrichedCompany::failed(Candidate::new("Beta", "https://beta.io", "FR"), "timeout");

        let md = render_companies(&[ok, failed]);
        assert!(md.starts_with("1. **Acme**\n   - Website: https://acme.com"));
        assert!(md.contains("   - Founded: 2016"));
        assert!(md.contains("   - Market Sector: Unknown"));
        assert!(md.contains("2. **Beta**"));
        assert!(md.contains("Research failed: timeout"));
    }
}
