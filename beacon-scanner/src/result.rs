use serde::{Deserialize, Deserializer, Serialize};

/// Rule impact levels, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Impact {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "minor" => Some(Impact::Minor),
            "moderate" => Some(Impact::Moderate),
            "serious" => Some(Impact::Serious),
            "critical" => Some(Impact::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Minor => "minor",
            Impact::Moderate => "moderate",
            Impact::Serious => "serious",
            Impact::Critical => "critical",
        }
    }
}

/// WCAG tag categories tracked per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WcagCategory {
    Wcag2A,
    Wcag2AA,
    Wcag21A,
    Wcag21AA,
}

impl WcagCategory {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "wcag2a" => Some(WcagCategory::Wcag2A),
            "wcag2aa" => Some(WcagCategory::Wcag2AA),
            "wcag21a" => Some(WcagCategory::Wcag21A),
            "wcag21aa" => Some(WcagCategory::Wcag21AA),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WcagCompliance {
    #[serde(default)]
    pub wcag2a: usize,
    #[serde(default)]
    pub wcag2aa: usize,
    #[serde(default)]
    pub wcag21a: usize,
    #[serde(default)]
    pub wcag21aa: usize,
}

impl WcagCompliance {
    pub fn increment(&mut self, category: WcagCategory) {
        match category {
            WcagCategory::Wcag2A => self.wcag2a += 1,
            WcagCategory::Wcag2AA => self.wcag2aa += 1,
            WcagCategory::Wcag21A => self.wcag21a += 1,
            WcagCategory::Wcag21AA => self.wcag21aa += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.wcag2a + self.wcag2aa + self.wcag21a + self.wcag21aa
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleImpact {
    #[serde(default)]
    pub minor: usize,
    #[serde(default)]
    pub moderate: usize,
    #[serde(default)]
    pub serious: usize,
    #[serde(default)]
    pub critical: usize,
}

impl RuleImpact {
    pub fn increment(&mut self, impact: Impact) {
        match impact {
            Impact::Minor => self.minor += 1,
            Impact::Moderate => self.moderate += 1,
            Impact::Serious => self.serious += 1,
            Impact::Critical => self.critical += 1,
        }
    }

    pub fn get(&self, impact: Impact) -> usize {
        match impact {
            Impact::Minor => self.minor,
            Impact::Moderate => self.moderate,
            Impact::Serious => self.serious,
            Impact::Critical => self.critical,
        }
    }

    pub fn total(&self) -> usize {
        self.minor + self.moderate + self.serious + self.critical
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationNode {
    pub target: String,
    pub html: String,
    #[serde(default)]
    pub failure_summary: String,
    pub xpath: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<ViolationNode>,
}

/// Aggregated audit result for one URL. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub url: String,
    pub relative_path: String,
    pub total_violations: usize,
    pub wcag_compliance: WcagCompliance,
    pub rule_impact: RuleImpact,
    pub violations: Vec<RuleViolation>,
    #[serde(deserialize_with = "percentage_from_number_or_string")]
    pub compliance_percentage: f64,
    pub total_requirements: usize,
}

// Older datasets stored the percentage as a preformatted string ("98.18")
fn percentage_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Percentage {
        Number(f64),
        Text(String),
    }

    match Percentage::deserialize(deserializer)? {
        Percentage::Number(n) => Ok(n),
        Percentage::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}
