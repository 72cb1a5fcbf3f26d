use crate::aggregate::aggregate;
use crate::audit::PageAuditor;
use crate::error::{Result, ScanError};
use crate::links::extract_url_path;
use crate::render::{DEFAULT_NAVIGATION_TIMEOUT, OpenOptions, PageRenderer};
use crate::result::PageReport;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_ANALYSIS_CONCURRENCY: usize = 3;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Called once per URL when its analysis finishes, with whether it produced a report
pub type AnalysisCallback = Arc<dyn Fn(String, bool) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Analyses in flight at once
    pub concurrency: usize,
    /// Extra attempts after the first failure
    pub max_retries: usize,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
    pub navigation_timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_ANALYSIS_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }
}

/// Audits pages and aggregates their violations.
pub struct Analyzer {
    renderer: Arc<dyn PageRenderer>,
    auditor: Arc<dyn PageAuditor>,
    config: AnalyzerConfig,
    callback: Option<AnalysisCallback>,
}

impl Analyzer {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        auditor: Arc<dyn PageAuditor>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            renderer,
            auditor,
            config,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: AnalysisCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Analyze every URL with at most `concurrency` analyses in flight.
    ///
    /// Reports come back in completion order, not input order. URLs that
    /// still fail after all retries are left out, so the result can be
    /// shorter than `urls`.
    pub async fn analyze<U: AsRef<str>>(&self, urls: &[U]) -> Vec<PageReport> {
        info!(
            "Analyzing {} URLs ({} concurrent, {} retries)",
            urls.len(),
            self.config.concurrency,
            self.config.max_retries
        );

        let outcomes: Vec<Option<PageReport>> = stream::iter(urls.iter().map(|u| u.as_ref()))
            .map(|url| self.analyze_url(url))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let reports: Vec<PageReport> = outcomes.into_iter().flatten().collect();
        info!(
            "Analysis complete. {} of {} URLs analyzed",
            reports.len(),
            urls.len()
        );
        reports
    }

    /// Analyze one URL, retrying with a fixed delay. `None` once retries
    /// are exhausted.
    pub async fn analyze_url(&self, url: &str) -> Option<PageReport> {
        let mut attempt = 0;

        loop {
            debug!("Analyzing URL: {} (attempt {})", url, attempt + 1);

            match self.attempt(url).await {
                Ok(report) => {
                    debug!(
                        "{}: {} violations, {:.2}% compliant",
                        url, report.total_violations, report.compliance_percentage
                    );
                    self.notify(url, true);
                    return Some(report);
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Error analyzing URL {}: {}. Retrying ({}/{})",
                        url, e, attempt, self.config.max_retries
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    error!(
                        "Dropping {} after {} attempts: {}",
                        url,
                        attempt + 1,
                        e
                    );
                    self.notify(url, false);
                    return None;
                }
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<PageReport> {
        let options = OpenOptions::default()
            .with_timeout(self.config.navigation_timeout)
            .with_bypass_csp(true);

        let mut page = tokio::time::timeout(
            self.config.navigation_timeout,
            self.renderer.open(url, &options),
        )
        .await
        .map_err(|_| ScanError::Timeout(url.to_string()))??;

        let audited = self.auditor.audit(&*page).await;

        // Released whether or not the audit succeeded
        if let Err(e) = page.close().await {
            warn!("Failed to close page {}: {}", url, e);
        }

        let violations = audited?;
        Ok(aggregate(&violations, url, &extract_url_path(url)))
    }

    fn notify(&self, url: &str, analyzed: bool) {
        if let Some(ref callback) = self.callback {
            callback(url.to_string(), analyzed);
        }
    }
}
