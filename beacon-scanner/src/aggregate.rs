// Raw rule violations to per-page reports, scored against TOTAL_CRITERIA

use crate::audit::{RawNode, RawViolation};
use crate::result::{
    Impact, PageReport, RuleImpact, RuleViolation, ViolationNode, WcagCategory, WcagCompliance,
};

/// Checkable WCAG success criteria in scope.
pub const TOTAL_CRITERIA: usize = 55;

/// Rendered in place of a node's xpath when the rule engine gave none.
pub const MISSING_XPATH: &str = "N/A";

/// Build the report for one page. Pure; unknown tags and impacts are
/// ignored rather than rejected.
pub fn aggregate(violations: &[RawViolation], url: &str, relative_path: &str) -> PageReport {
    let mut wcag_compliance = WcagCompliance::default();
    let mut rule_impact = RuleImpact::default();

    for violation in violations {
        for category in violation.tags.iter().filter_map(|t| WcagCategory::from_tag(t)) {
            wcag_compliance.increment(category);
        }
        if let Some(impact) = violation.impact.as_deref().and_then(Impact::parse) {
            rule_impact.increment(impact);
        }
    }

    let total_violations = violations.len();

    PageReport {
        url: url.to_string(),
        relative_path: relative_path.to_string(),
        total_violations,
        wcag_compliance,
        rule_impact,
        violations: violations.iter().map(convert_violation).collect(),
        compliance_percentage: compliance_percentage(TOTAL_CRITERIA, total_violations),
        total_requirements: TOTAL_CRITERIA,
    }
}

/// `(requirements - violations) / requirements * 100`, rounded to two
/// decimals. No requirements scores 100. More violations than
/// requirements gives a negative score.
pub fn compliance_percentage(total_requirements: usize, total_violations: usize) -> f64 {
    if total_requirements == 0 {
        return 100.0;
    }
    let percentage = (total_requirements as f64 - total_violations as f64)
        / total_requirements as f64
        * 100.0;
    (percentage * 100.0).round() / 100.0
}

/// Escape `& < > " '` for display inside an HTML report. `&` goes first so
/// the entities produced by later replacements are not escaped again.
pub fn escape_html(unsafe_html: &str) -> String {
    unsafe_html
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

fn convert_violation(violation: &RawViolation) -> RuleViolation {
    RuleViolation {
        id: violation.id.clone(),
        impact: violation.impact.clone(),
        description: violation.description.clone(),
        help: violation.help.clone(),
        help_url: violation.help_url.clone(),
        tags: violation.tags.clone(),
        nodes: violation.nodes.iter().map(convert_node).collect(),
    }
}

fn convert_node(node: &RawNode) -> ViolationNode {
    ViolationNode {
        target: node.target.join(", "),
        html: escape_html(&node.html),
        failure_summary: node.failure_summary.clone(),
        xpath: node
            .xpath
            .as_ref()
            .map(|parts| parts.join(", "))
            .unwrap_or_else(|| MISSING_XPATH.to_string()),
    }
}
