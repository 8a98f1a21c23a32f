//! Scout run requests.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Parameters for one Discovery → Deep-Dive run.
///
/// Accepts both camelCase (`searchCriteria`) and snake_case
/// (`search_criteria`) field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutRequest {
    #[serde(alias = "search_criteria")]
    pub search_criteria: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "funding_stage")]
    pub funding_stage: Option<String>,
    /// Extra attributes the deep dive should look for, by name.
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl ScoutRequest {
    pub fn new(search_criteria: impl Into<String>) -> Self {
        Self {
            search_criteria: search_criteria.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_funding_stage(mut self, stage: impl Into<String>) -> Self {
        self.funding_stage = Some(stage.into());
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = String>) -> Self {
        self.attributes = attributes.into_iter().collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.search_criteria.trim().is_empty() {
            return Err(ScoutError::InvalidRequest(
                "searchCriteria must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Non-blank location filter.
    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    /// Non-blank funding stage filter.
    pub fn funding_stage(&self) -> Option<&str> {
        non_blank(self.funding_stage.as_deref())
    }

    /// Search query: criteria plus `location:` / `funding_stage:` qualifiers.
    pub fn search_query(&self) -> String {
        let mut query = self.search_criteria.trim().to_string();
        if let Some(location) = self.location() {
            query.push_str(&format!(" location:{location}"));
        }
        if let Some(stage) = self.funding_stage() {
            query.push_str(&format!(" funding_stage:{stage}"));
        }
        query
    }

    /// Requested attribute names, trimmed, without blanks or duplicates.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in &self.attributes {
            let name = name.trim();
            if !name.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name.to_string());
            }
        }
        names
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_casings() {
        let camel: ScoutRequest = serde_json::from_str(
            r#"{"searchCriteria":"AI healthcare","location":"Germany","fundingStage":"Seed"}"#,
        )
        .unwrap();
        let snake: ScoutRequest = serde_json::from_str(
            r#"{"search_criteria":"AI healthcare","location":"Germany","funding_stage":"Seed","email":"x@y.z"}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_search_query_appends_filters() {
        let req = ScoutRequest::new("AI healthcare ")
            .with_location("Germany")
            .with_funding_stage(" ");
        assert_eq!(req.search_query(), "AI healthcare location:Germany");
    }

    #[test]
    fn test_blank_criteria_is_invalid() {
        let err = ScoutRequest::new("   ").validate().unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn test_attribute_names_dedupes() {
        let req = ScoutRequest::new("x").with_attributes(vec![
            "CEO".to_string(),
            " ".to_string(),
            "ceo".to_string(),
            "Headcount".to_string(),
        ]);
        assert_eq!(req.attribute_names(), vec!["CEO", "Headcount"]);
    }
}
