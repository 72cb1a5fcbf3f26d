// Audit pipeline from target selection to report output

use crate::config::AuditConfig;
use crate::crawl::{CrawlOptions, execute_crawl};
use crate::error::{CoreError, Result};
use crate::report::{
    ReportFormat, RunStats, gather_report_data, parse_formats, write_reports,
};
use crate::store::{ResultStore, existing_urls};
use beacon_scanner::{Analyzer, CrawlUrl, PageAuditor, PageRenderer, PageReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct AuditOutcome {
    /// Full merged dataset as written to disk
    pub dataset: Vec<PageReport>,
    pub stats: RunStats,
    pub dataset_path: PathBuf,
    pub reports: Vec<PathBuf>,
}

/// Run one audit.
///
/// URLs already in the saved dataset are not analyzed again. Fresh results
/// are merged in and written to disk before any report is generated.
pub async fn execute_audit(
    config: &AuditConfig,
    renderer: Arc<dyn PageRenderer>,
    auditor: Arc<dyn PageAuditor>,
    show_progress_bars: bool,
) -> Result<AuditOutcome> {
    config.validate()?;
    let formats = parse_formats(&config.formats)?;
    let output_dir = config.output_dir();
    let store = ResultStore::new(&output_dir);

    let existing = store.load()?;
    let known = existing_urls(&existing);

    let targets = if config.uses_relative_paths() {
        info!(
            "Using {} configured relative paths, skipping crawl",
            config.relative_paths.len()
        );
        config.relative_urls()
    } else {
        let options = CrawlOptions {
            base_url: config.base_url.clone(),
            max_pages: config.max_pages_to_visit,
            concurrency: config.concurrency,
            navigation_timeout: config.navigation_timeout(),
            show_progress_bars,
        };
        execute_crawl(options, renderer.clone(), None)
            .await?
            .into_iter()
            .map(CrawlUrl::into_string)
            .collect()
    };

    let (pending, skipped) = pending_urls(targets, &known);
    info!(
        "{} URLs to analyze, {} already in results",
        pending.len(),
        skipped
    );

    let fresh = if pending.is_empty() {
        Vec::new()
    } else {
        let progress_bar = show_progress_bars.then(|| Arc::new(analysis_bar(pending.len())));
        let mut analyzer = Analyzer::new(renderer, auditor, config.analyzer_config());
        if let Some(ref pb) = progress_bar {
            let pb = pb.clone();
            analyzer = analyzer.with_callback(Arc::new(move |url: String, _analyzed: bool| {
                pb.set_message(url);
                pb.inc(1);
            }));
        }

        let fresh = analyzer.analyze(&pending).await;
        if let Some(ref pb) = progress_bar {
            pb.finish_with_message(format!("Analyzed {} pages", fresh.len()));
        }
        fresh
    };

    let stats = RunStats {
        analyzed: fresh.len(),
        skipped,
        dropped: pending.len() - fresh.len(),
    };

    let dataset = store.checkpoint(existing, fresh)?;
    info!(
        "Saved {} results to {}",
        dataset.len(),
        store.path().display()
    );

    let data = gather_report_data(&dataset, Some(stats));
    let reports = write_reports(&data, &formats, &output_dir)?;

    Ok(AuditOutcome {
        dataset,
        stats,
        dataset_path: store.path().to_path_buf(),
        reports,
    })
}

/// Rewrite report files from a saved dataset without loading any page.
pub fn regenerate_reports(output_dir: &Path, formats: &[ReportFormat]) -> Result<Vec<PathBuf>> {
    let store = ResultStore::new(output_dir);
    if !store.exists() {
        return Err(CoreError::Report(format!(
            "No results found at {}",
            store.path().display()
        )));
    }

    let dataset = store.load()?;
    let data = gather_report_data(&dataset, None);
    write_reports(&data, formats, output_dir)
}

/// Split targets into URLs still to analyze and a count of those already
/// persisted. Repeated targets are analyzed once.
pub fn pending_urls(targets: Vec<String>, known: &HashSet<String>) -> (Vec<String>, usize) {
    let mut queued = HashSet::new();
    let mut pending = Vec::new();
    let mut skipped = 0;

    for url in targets {
        if known.contains(&url) {
            info!("Skipping duplicate URL: {}", url);
            skipped += 1;
        } else if queued.insert(url.clone()) {
            pending.push(url);
        }
    }

    (pending, skipped)
}

fn analysis_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_pending_urls_skips_persisted() {
        let targets = vec![
            "http://example.com/".to_string(),
            "http://example.com/about".to_string(),
        ];

        let (pending, skipped) = pending_urls(targets, &known(&["http://example.com/"]));

        assert_eq!(pending, vec!["http://example.com/about"]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_pending_urls_collapses_repeats() {
        let targets = vec![
            "http://example.com/a".to_string(),
            "http://example.com/a".to_string(),
        ];

        let (pending, skipped) = pending_urls(targets, &HashSet::new());

        assert_eq!(pending, vec!["http://example.com/a"]);
        assert_eq!(skipped, 0);
    }
}
