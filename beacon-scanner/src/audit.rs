use crate::error::Result;
use crate::render::RenderedPage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One rule failing on one page, as reported by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

/// An element the rule failed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub target: Vec<String>,
    pub html: String,
    #[serde(default)]
    pub failure_summary: String,
    #[serde(default)]
    pub xpath: Option<Vec<String>>,
}

/// Accessibility rule engine run against a live page.
#[async_trait]
pub trait PageAuditor: Send + Sync {
    async fn audit(&self, page: &dyn RenderedPage) -> Result<Vec<RawViolation>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_violation_reads_rule_engine_json() {
        let json = r#"{
            "id": "image-alt",
            "impact": "critical",
            "description": "Ensures <img> elements have alternate text",
            "help": "Images must have alternate text",
            "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/image-alt",
            "tags": ["cat.text-alternatives", "wcag2a", "wcag111"],
            "nodes": [{
                "target": ["img.hero"],
                "html": "<img class=\"hero\" src=\"a.png\">",
                "failureSummary": "Fix any of the following: Element does not have an alt attribute"
            }]
        }"#;

        let violation: RawViolation = serde_json::from_str(json).unwrap();

        assert_eq!(violation.id, "image-alt");
        assert_eq!(violation.impact.as_deref(), Some("critical"));
        assert_eq!(violation.tags.len(), 3);
        assert_eq!(violation.nodes[0].target, vec!["img.hero".to_string()]);
        assert!(violation.nodes[0].xpath.is_none());
    }

    #[test]
    fn test_raw_violation_tolerates_missing_impact() {
        let json = r#"{"id":"x","impact":null,"description":"d","help":"h","helpUrl":"u","tags":[],"nodes":[]}"#;
        let violation: RawViolation = serde_json::from_str(json).unwrap();
        assert!(violation.impact.is_none());
    }
}
