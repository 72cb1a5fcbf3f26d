// Tests for the end-to-end audit pipeline

mod common;

use beacon_core::audit::{execute_audit, regenerate_reports};
use beacon_core::config::AuditConfig;
use beacon_core::report::ReportFormat;
use beacon_core::store::ResultStore;
use beacon_scanner::aggregate::aggregate;
use beacon_scanner::{PageReport, StaticAuditor};
use common::{BASE, SiteRenderer, clean_page, page_with_missing_alt};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn site() -> SiteRenderer {
    SiteRenderer::new()
        .page("/", clean_page(&["/about", "/contact", "https://elsewhere.test/"]))
        .page("/about", page_with_missing_alt(&["/"]))
        .page("/contact", clean_page(&["/", "/brochure.pdf"]))
}

fn config(dir: &TempDir) -> AuditConfig {
    let mut config = AuditConfig::new(BASE);
    config.output_dir = dir.path().to_path_buf();
    config.retry_delay_ms = 0;
    config
}

fn urls(reports: &[PageReport]) -> Vec<&str> {
    reports.iter().map(|r| r.url.as_str()).collect()
}

// ============================================================================
// Crawl Mode Tests
// ============================================================================

#[tokio::test]
async fn test_audit_crawls_and_analyzes_every_page() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(site());

    let outcome = execute_audit(&config(&dir), renderer, Arc::new(StaticAuditor::new()), false)
        .await
        .unwrap();

    assert_eq!(outcome.dataset.len(), 3);
    assert_eq!(outcome.stats.analyzed, 3);
    assert_eq!(outcome.stats.skipped, 0);
    assert_eq!(outcome.stats.dropped, 0);

    let about = outcome
        .dataset
        .iter()
        .find(|r| r.url == "http://site.test/about")
        .unwrap();
    assert_eq!(about.relative_path, "/about");
    assert_eq!(about.total_violations, 1);
    assert_eq!(about.rule_impact.critical, 1);
    assert_eq!(about.compliance_percentage, 98.18);
}

#[tokio::test]
async fn test_audit_persists_dataset_and_default_reports() {
    let dir = TempDir::new().unwrap();

    let outcome = execute_audit(
        &config(&dir),
        Arc::new(site()),
        Arc::new(StaticAuditor::new()),
        false,
    )
    .await
    .unwrap();

    assert_eq!(outcome.dataset_path, dir.path().join("accessibility-results.json"));
    let saved: Vec<PageReport> =
        serde_json::from_str(&fs::read_to_string(&outcome.dataset_path).unwrap()).unwrap();
    assert_eq!(saved, outcome.dataset);

    assert_eq!(outcome.reports.len(), 2);
    assert!(dir.path().join("accessibility-report.json").exists());
    let html = fs::read_to_string(dir.path().join("accessibility-results.html")).unwrap();
    assert!(html.contains("const fetchedData = ["));
}

// ============================================================================
// Incremental Run Tests
// ============================================================================

#[tokio::test]
async fn test_second_run_skips_known_urls() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    execute_audit(&config, Arc::new(site()), Arc::new(StaticAuditor::new()), false)
        .await
        .unwrap();

    let renderer = Arc::new(site());
    let outcome = execute_audit(&config, renderer.clone(), Arc::new(StaticAuditor::new()), false)
        .await
        .unwrap();

    assert_eq!(outcome.stats.analyzed, 0);
    assert_eq!(outcome.stats.skipped, 3);
    assert_eq!(outcome.dataset.len(), 3);
    // Crawl visits only, nothing opened for analysis
    assert_eq!(renderer.opens(), 3);
}

#[tokio::test]
async fn test_existing_entries_are_kept_verbatim() {
    let dir = TempDir::new().unwrap();
    let mut kept = aggregate(&[], "http://site.test/", "/kept");
    kept.compliance_percentage = 42.0;
    ResultStore::new(dir.path()).save(&[kept.clone()]).unwrap();

    let outcome = execute_audit(
        &config(&dir),
        Arc::new(site()),
        Arc::new(StaticAuditor::new()),
        false,
    )
    .await
    .unwrap();

    assert_eq!(outcome.dataset[0], kept);
    assert_eq!(outcome.dataset.len(), 3);
    assert_eq!(outcome.stats.skipped, 1);
    assert_eq!(outcome.stats.analyzed, 2);
}

#[tokio::test]
async fn test_corrupt_dataset_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("accessibility-results.json"), "{ not json").unwrap();

    let err = execute_audit(
        &config(&dir),
        Arc::new(site()),
        Arc::new(StaticAuditor::new()),
        false,
    )
    .await
    .err()
    .unwrap();

    assert!(err.is_persistence());
}

// ============================================================================
// Relative Path Mode Tests
// ============================================================================

#[tokio::test]
async fn test_relative_paths_bypass_crawl() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.relative_paths = vec!["/contact".to_string(), "/about".to_string()];
    let renderer = Arc::new(site());

    let outcome = execute_audit(&config, renderer.clone(), Arc::new(StaticAuditor::new()), false)
        .await
        .unwrap();

    let mut analyzed = urls(&outcome.dataset);
    analyzed.sort();
    assert_eq!(analyzed, vec!["http://site.test/about", "http://site.test/contact"]);
    assert_eq!(renderer.opens(), 2);
}

// ============================================================================
// Failure Handling Tests
// ============================================================================

#[tokio::test]
async fn test_broken_page_is_dropped_after_retries() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.relative_paths = vec!["/".to_string(), "/down".to_string()];
    let renderer = Arc::new(site().broken("/down"));

    let outcome = execute_audit(&config, renderer.clone(), Arc::new(StaticAuditor::new()), false)
        .await
        .unwrap();

    assert_eq!(urls(&outcome.dataset), vec!["http://site.test/"]);
    assert_eq!(outcome.stats.dropped, 1);
    let attempts = renderer
        .opened()
        .iter()
        .filter(|u| u.as_str() == "http://site.test/down")
        .count();
    assert_eq!(attempts, 4);
}

#[tokio::test]
async fn test_unknown_report_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.formats = vec!["pdf".to_string()];

    let err = execute_audit(&config, Arc::new(site()), Arc::new(StaticAuditor::new()), false)
        .await
        .err()
        .unwrap();

    assert!(err.is_config());
}

// ============================================================================
// Report Regeneration Tests
// ============================================================================

#[test]
fn test_regenerate_without_dataset_fails() {
    let dir = TempDir::new().unwrap();
    assert!(regenerate_reports(dir.path(), &[ReportFormat::Html]).is_err());
}

#[test]
fn test_regenerate_writes_requested_formats() {
    let dir = TempDir::new().unwrap();
    ResultStore::new(dir.path())
        .save(&[aggregate(&[], "http://site.test/", "/")])
        .unwrap();

    let written =
        regenerate_reports(dir.path(), &[ReportFormat::Text, ReportFormat::Markdown]).unwrap();

    assert_eq!(
        written,
        vec![
            dir.path().join("accessibility-summary.txt"),
            dir.path().join("accessibility-report.md"),
        ]
    );
    let text = fs::read_to_string(&written[0]).unwrap();
    assert!(text.contains("Pages:              1"));
    assert!(!text.contains("Skipped:"));
}
