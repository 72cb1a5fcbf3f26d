use crate::error::{Result, ScanError};
use crate::frontier::{Frontier, VisitedSet};
use crate::links::{CrawlUrl, is_crawlable_href, is_in_scope, is_media_file, normalize};
use crate::render::{DEFAULT_NAVIGATION_TIMEOUT, OpenOptions, PageRenderer};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_CRAWL_CONCURRENCY: usize = 3;

/// Called with the running visit count and the URL being dispatched
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Breadth-first site crawler.
///
/// Pages are visited in batches of at most `concurrency`. A batch is
/// dispatched in parallel and the next one only starts once every page in
/// it has finished, so no more than `concurrency` pages are ever open at
/// once.
pub struct Crawler {
    renderer: Arc<dyn PageRenderer>,
    max_pages: Option<usize>,
    concurrency: usize,
    navigation_timeout: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            max_pages: None,
            concurrency: DEFAULT_CRAWL_CONCURRENCY,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            progress_callback: None,
        }
    }

    /// Cap on visited pages. `None` crawls until the frontier runs dry.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Crawl everything reachable from `base_url` that stays under it.
    ///
    /// Returns the visited URLs in visit order. Individual page failures
    /// are logged and count as pages without links; only an unusable
    /// `base_url` fails the crawl.
    pub async fn crawl(&self, base_url: &str) -> Result<Vec<CrawlUrl>> {
        let seed = normalize("", base_url)
            .ok_or_else(|| ScanError::InvalidUrl(format!("Invalid base URL: {}", base_url)))?;

        info!(
            "Starting crawl of {} ({} concurrent, max pages: {})",
            seed,
            self.concurrency,
            self.max_pages
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );

        let max_pages = self.max_pages.unwrap_or(usize::MAX);
        let options = OpenOptions::default().with_timeout(self.navigation_timeout);
        let mut frontier = Frontier::seeded(seed);
        let mut visited = VisitedSet::new();

        while !frontier.is_empty() && visited.len() < max_pages {
            let mut batch = Vec::with_capacity(self.concurrency);
            for url in frontier.pop_batch(self.concurrency) {
                if visited.len() >= max_pages {
                    break;
                }
                // Marked before the load starts so no later batch can dispatch it again
                if visited.insert(url.clone()) {
                    if let Some(ref callback) = self.progress_callback {
                        callback(visited.len(), url.to_string());
                    }
                    batch.push(url);
                } else {
                    debug!("Skipping already visited {}", url);
                }
            }

            let discovered = join_all(batch.iter().map(|url| self.visit(url, &options))).await;

            for href in discovered.into_iter().flatten() {
                if let Some(url) = accept_link(&href, base_url, &visited, &frontier) {
                    debug!("  -> Queuing {}", url);
                    frontier.push(url);
                }
            }
        }

        info!("Crawl complete. Visited {} pages", visited.len());
        Ok(visited.into_vec())
    }

    /// Load one page and return its hrefs. Never fails: errors are logged
    /// and yield no links.
    async fn visit(&self, url: &CrawlUrl, options: &OpenOptions) -> Vec<String> {
        debug!("Currently visiting: {}", url);

        let opened =
            tokio::time::timeout(self.navigation_timeout, self.renderer.open(url.as_str(), options))
                .await;

        let mut page = match opened {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                warn!("Error fetching URL {}: {}", url, e);
                return Vec::new();
            }
            Err(_) => {
                warn!("Error fetching URL {}: {}", url, ScanError::Timeout(url.to_string()));
                return Vec::new();
            }
        };

        let links = match page.extract_links().await {
            Ok(links) => links,
            Err(e) => {
                warn!("Failed to extract links from {}: {}", url, e);
                Vec::new()
            }
        };

        if let Err(e) = page.close().await {
            warn!("Failed to close page {}: {}", url, e);
        }

        debug!("Found {} links on {}", links.len(), url);
        links
    }
}

fn accept_link(
    href: &str,
    base_url: &str,
    visited: &VisitedSet,
    frontier: &Frontier,
) -> Option<CrawlUrl> {
    if !is_crawlable_href(href) {
        return None;
    }
    let url = normalize(href, base_url)?;
    if !is_in_scope(url.as_str(), base_url)
        || visited.contains(&url)
        || frontier.contains(&url)
        || is_media_file(url.as_str())
    {
        return None;
    }
    Some(url)
}
