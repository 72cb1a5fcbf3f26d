// In-memory renderer and auditor doubles for unit tests

use crate::audit::{PageAuditor, RawViolation};
use crate::error::{Result, ScanError};
use crate::render::{OpenOptions, PageRenderer, RenderedPage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Counters {
    closed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub struct FakePage {
    url: String,
    html: String,
    links: Vec<String>,
    counters: Arc<Counters>,
}

#[async_trait]
impl RenderedPage for FakePage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn extract_links(&self) -> Result<Vec<String>> {
        Ok(self.links.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serves a fixed link graph. URLs are matched verbatim.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, (String, Vec<String>)>,
    failures: Mutex<HashMap<String, usize>>,
    hanging: HashSet<String>,
    delay: Duration,
    opened: Mutex<Vec<(String, OpenOptions)>>,
    counters: Arc<Counters>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, links: &[&str]) -> Self {
        let links = links.iter().map(|l| l.to_string()).collect();
        self.pages
            .insert(url.to_string(), ("<html></html>".to_string(), links));
        self
    }

    /// Fail the next `times` opens of `url`.
    pub fn failing(self, url: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    /// Never finish opening `url`.
    pub fn hanging(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn open_options(&self) -> Vec<OpenOptions> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    pub fn closed_count(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn open(&self, url: &str, options: &OpenOptions) -> Result<Box<dyn RenderedPage>> {
        self.opened
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));

        if self.hanging.contains(url) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Err(ScanError::Timeout(url.to_string()));
        }

        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if should_fail {
            return Err(ScanError::navigation(url, "net::ERR_CONNECTION_RESET"));
        }

        let (html, links) = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScanError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"))?;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(Box::new(FakePage {
            url: url.to_string(),
            html,
            links,
            counters: self.counters.clone(),
        }))
    }
}

/// Returns canned violations per URL, optionally failing first.
#[derive(Default)]
pub struct FakeAuditor {
    violations: HashMap<String, Vec<RawViolation>>,
    failures: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
}

impl FakeAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_violations(mut self, url: &str, violations: Vec<RawViolation>) -> Self {
        self.violations.insert(url.to_string(), violations);
        self
    }

    pub fn failing(self, url: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageAuditor for FakeAuditor {
    async fn audit(&self, page: &dyn RenderedPage) -> Result<Vec<RawViolation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = page.url().to_string();

        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if should_fail {
            return Err(ScanError::audit(url, "axe script injection failed"));
        }

        Ok(self.violations.get(&url).cloned().unwrap_or_default())
    }
}
