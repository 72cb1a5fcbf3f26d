// Report generation from the persisted dataset

use crate::error::{CoreError, Result};
use beacon_scanner::aggregate::escape_html;
use beacon_scanner::result::{Impact, PageReport, RuleImpact, WcagCompliance};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Html,
    Markdown,
}

impl ReportFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "html" => Some(ReportFormat::Html),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    /// File written for this format inside the output directory. The JSON
    /// report has its own name so it never replaces the dataset file.
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Text => "accessibility-summary.txt",
            ReportFormat::Json => "accessibility-report.json",
            ReportFormat::Html => "accessibility-results.html",
            ReportFormat::Markdown => "accessibility-report.md",
        }
    }

    pub fn render(&self, data: &ReportData) -> Result<String> {
        match self {
            ReportFormat::Text => Ok(generate_text_report(data)),
            ReportFormat::Json => {
                generate_json_report(data).map_err(|e| CoreError::Report(e.to_string()))
            }
            ReportFormat::Html => {
                generate_html_report(data).map_err(|e| CoreError::Report(e.to_string()))
            }
            ReportFormat::Markdown => Ok(generate_markdown_report(data)),
        }
    }
}

/// Parse configured format names, rejecting unknown ones.
pub fn parse_formats(names: &[String]) -> Result<Vec<ReportFormat>> {
    let mut formats = Vec::new();
    for name in names {
        let format = ReportFormat::from_str(name)
            .ok_or_else(|| CoreError::Config(format!("Unknown report format: {}", name)))?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

/// Counts from a single pipeline run. Absent when regenerating reports
/// from a saved dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub analyzed: usize,
    pub skipped: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_pages: usize,
    pub total_violations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_compliance: Option<f64>,
    pub impact_totals: RuleImpact,
    pub wcag_totals: WcagCompliance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub generated_at: String,
    pub summary: DatasetSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunStats>,
    pub pages: Vec<PageReport>,
}

pub fn gather_report_data(pages: &[PageReport], run: Option<RunStats>) -> ReportData {
    ReportData {
        generated_at: chrono::Utc::now().to_rfc3339(),
        summary: summarize(pages),
        run,
        pages: pages.to_vec(),
    }
}

pub fn summarize(pages: &[PageReport]) -> DatasetSummary {
    let mut impact_totals = RuleImpact::default();
    let mut wcag_totals = WcagCompliance::default();

    for page in pages {
        impact_totals.minor += page.rule_impact.minor;
        impact_totals.moderate += page.rule_impact.moderate;
        impact_totals.serious += page.rule_impact.serious;
        impact_totals.critical += page.rule_impact.critical;

        wcag_totals.wcag2a += page.wcag_compliance.wcag2a;
        wcag_totals.wcag2aa += page.wcag_compliance.wcag2aa;
        wcag_totals.wcag21a += page.wcag_compliance.wcag21a;
        wcag_totals.wcag21aa += page.wcag_compliance.wcag21aa;
    }

    let average_compliance = if pages.is_empty() {
        None
    } else {
        let sum: f64 = pages.iter().map(|p| p.compliance_percentage).sum();
        Some((sum / pages.len() as f64 * 100.0).round() / 100.0)
    };

    DatasetSummary {
        total_pages: pages.len(),
        total_violations: pages.iter().map(|p| p.total_violations).sum(),
        average_compliance,
        impact_totals,
        wcag_totals,
    }
}

const IMPACT_ORDER: [Impact; 4] = [
    Impact::Critical,
    Impact::Serious,
    Impact::Moderate,
    Impact::Minor,
];

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                      BEACON ACCESSIBILITY AUDIT REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("Generated:    {}\n", data.generated_at));
    if let Some(run) = data.run {
        report.push_str(&format!("Analyzed:     {}\n", run.analyzed));
        report.push_str(&format!("Skipped:      {}  (already in results)\n", run.skipped));
        report.push_str(&format!("Dropped:      {}  (failed after retries)\n", run.dropped));
    }
    report.push('\n');

    report.push_str(RULE);
    report.push_str("SUMMARY\n");
    report.push_str(RULE);
    report.push('\n');

    let summary = &data.summary;
    report.push_str(&format!("Pages:              {}\n", summary.total_pages));
    report.push_str(&format!(
        "Average compliance: {}\n",
        format_average(summary.average_compliance)
    ));
    report.push_str(&format!("Total violations:   {}\n\n", summary.total_violations));

    for impact in IMPACT_ORDER {
        let count = summary.impact_totals.get(impact);
        if count > 0 {
            report.push_str(&format!(
                "  [{:<8}] {}\n",
                impact.as_str().to_uppercase(),
                count
            ));
        }
    }
    report.push('\n');

    if !data.pages.is_empty() {
        report.push_str(RULE);
        report.push_str("PAGES (least compliant first)\n");
        report.push_str(RULE);
        report.push('\n');

        for page in pages_by_compliance(&data.pages) {
            report.push_str(&format!(
                "  {:>6.2}%  {}  ({} violations)\n",
                page.compliance_percentage, page.relative_path, page.total_violations
            ));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push_str("                                End of Report\n");
    report.push_str(RULE);

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Beacon",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": data.generated_at,
                "format": "json"
            },
            "run": data.run,
            "summary": data.summary,
            "pages": data.pages
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();
    let summary = &data.summary;

    report.push_str("# Accessibility Audit Report\n\n");
    report.push_str(&format!("_Generated {}_\n\n", data.generated_at));

    report.push_str("## Summary\n\n");
    report.push_str("| Metric | Value |\n|---|---|\n");
    report.push_str(&format!("| Pages | {} |\n", summary.total_pages));
    report.push_str(&format!(
        "| Average compliance | {} |\n",
        format_average(summary.average_compliance)
    ));
    report.push_str(&format!("| Total violations | {} |\n", summary.total_violations));
    for impact in IMPACT_ORDER {
        report.push_str(&format!(
            "| {} | {} |\n",
            capitalize(impact.as_str()),
            summary.impact_totals.get(impact)
        ));
    }
    if let Some(run) = data.run {
        report.push_str(&format!("| Analyzed this run | {} |\n", run.analyzed));
        report.push_str(&format!("| Skipped | {} |\n", run.skipped));
        report.push_str(&format!("| Dropped | {} |\n", run.dropped));
    }
    report.push('\n');

    for page in &data.pages {
        report.push_str(&format!("## {}\n\n", page.url));
        report.push_str(&format!(
            "Compliance **{:.2}%**, {} violations.\n\n",
            page.compliance_percentage, page.total_violations
        ));

        if page.violations.is_empty() {
            continue;
        }

        report.push_str("| Rule | Impact | Nodes | Help |\n|---|---|---|---|\n");
        for violation in &page.violations {
            report.push_str(&format!(
                "| `{}` | {} | {} | [{}]({}) |\n",
                violation.id,
                violation.impact.as_deref().unwrap_or("-"),
                violation.nodes.len(),
                violation.help.replace('|', "\\|"),
                violation.help_url
            ));
        }
        report.push('\n');
    }

    report
}

pub fn generate_html_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let embedded = embed_json(&data.pages)?;
    let summary = &data.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Accessibility Audit Report</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    html.push_str("<h1>Accessibility Audit Report</h1>\n");
    html.push_str(&format!(
        "<p class=\"generated\">Generated {}</p>\n",
        escape_html(&data.generated_at)
    ));

    html.push_str("<section id=\"summary\">\n<h2>Summary</h2>\n<ul>\n");
    html.push_str(&format!("<li>Pages: {}</li>\n", summary.total_pages));
    html.push_str(&format!(
        "<li>Average compliance: {}</li>\n",
        format_average(summary.average_compliance)
    ));
    html.push_str(&format!("<li>Total violations: {}</li>\n", summary.total_violations));
    html.push_str("</ul>\n");
    html.push_str(&impact_list(&summary.impact_totals));
    html.push_str("</section>\n");

    html.push_str("<nav id=\"index\">\n<h2>Pages</h2>\n<ol>\n");
    for (idx, page) in data.pages.iter().enumerate() {
        html.push_str(&format!(
            "<li><a href=\"#page-{}\">{}</a> ({:.2}%)</li>\n",
            idx + 1,
            escape_html(&page.relative_path),
            page.compliance_percentage
        ));
    }
    html.push_str("</ol>\n</nav>\n");

    for (idx, page) in data.pages.iter().enumerate() {
        html.push_str(&page_section(idx + 1, page));
    }

    html.push_str("<script>\n");
    html.push_str(&format!("const fetchedData = {};\n", embedded));
    html.push_str("</script>\n</body>\n</html>\n");

    Ok(html)
}

fn page_section(number: usize, page: &PageReport) -> String {
    let mut html = String::new();

    html.push_str(&format!("<section class=\"page\" id=\"page-{}\">\n", number));
    html.push_str(&format!(
        "<h2><a href=\"{0}\">{0}</a></h2>\n",
        escape_html(&page.url)
    ));
    html.push_str(&format!(
        "<p>Compliance: <strong>{:.2}%</strong> ({} violations against {} criteria)</p>\n",
        page.compliance_percentage, page.total_violations, page.total_requirements
    ));
    html.push_str(&impact_list(&page.rule_impact));

    if page.violations.is_empty() {
        html.push_str("<p class=\"clean\">No violations found.</p>\n</section>\n");
        return html;
    }

    html.push_str("<table>\n<thead><tr>");
    for heading in ["Rule", "Impact", "Description", "HTML", "Failure summary"] {
        html.push_str(&format!("<th>{}</th>", heading));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for violation in &page.violations {
        let impact = violation.impact.as_deref().unwrap_or("unknown");
        let rule = format!(
            "<td><a href=\"{}\">{}</a></td><td class=\"impact-{}\">{}</td><td>{}</td>",
            escape_html(&violation.help_url),
            escape_html(&violation.id),
            escape_html(impact),
            escape_html(impact),
            escape_html(&violation.description)
        );

        if violation.nodes.is_empty() {
            html.push_str(&format!("<tr>{}<td></td><td></td></tr>\n", rule));
        }
        // Node html was escaped when the report was aggregated
        for node in &violation.nodes {
            html.push_str(&format!(
                "<tr>{}<td><code>{}</code></td><td>{}</td></tr>\n",
                rule,
                node.html,
                escape_html(&node.failure_summary)
            ));
        }
    }

    html.push_str("</tbody>\n</table>\n</section>\n");
    html
}

fn impact_list(counts: &RuleImpact) -> String {
    let mut html = String::from("<ul class=\"impact-summary\">\n");
    for impact in IMPACT_ORDER {
        html.push_str(&format!(
            "<li class=\"impact-{}\">{}: {}</li>\n",
            impact.as_str(),
            capitalize(impact.as_str()),
            counts.get(impact)
        ));
    }
    html.push_str("</ul>\n");
    html
}

/// Serialize for an inline `<script>`. `</` is written as `<\/` so markup
/// captured from audited pages cannot close the script element early.
fn embed_json(pages: &[PageReport]) -> std::result::Result<String, serde_json::Error> {
    Ok(serde_json::to_string(pages)?.replace("</", "<\\/"))
}

const STYLE: &str = r#"<style>
body { font-family: system-ui, sans-serif; margin: 2rem; color: #1b1b1b; }
table { border-collapse: collapse; width: 100%; margin-bottom: 2rem; }
th, td { border: 1px solid #ccc; padding: 0.4rem; text-align: left; vertical-align: top; }
code { white-space: pre-wrap; word-break: break-all; }
.impact-critical { color: #a40000; }
.impact-serious { color: #c25400; }
.impact-moderate { color: #7a6300; }
.impact-minor { color: #2d5f8a; }
</style>
"#;

fn pages_by_compliance(pages: &[PageReport]) -> Vec<&PageReport> {
    let mut sorted: Vec<&PageReport> = pages.iter().collect();
    sorted.sort_by(|a, b| a.compliance_percentage.total_cmp(&b.compliance_percentage));
    sorted
}

fn format_average(average: Option<f64>) -> String {
    average
        .map(|a| format!("{:.2}%", a))
        .unwrap_or_else(|| "n/a".to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Render every format into `output_dir`. Returns the written paths.
pub fn write_reports(
    data: &ReportData,
    formats: &[ReportFormat],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|source| CoreError::Persistence {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for format in formats {
        let content = format.render(data)?;
        let path = output_dir.join(format.file_name());
        save_report(&content, &path).map_err(|source| CoreError::Persistence {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {:?} report to {}", format, path.display());
        written.push(path);
    }

    Ok(written)
}
