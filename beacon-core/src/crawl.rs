use crate::error::Result;
use beacon_scanner::links::extract_url_path;
use beacon_scanner::{CrawlUrl, Crawler, PageRenderer};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub base_url: String,
    pub max_pages: Option<usize>,
    pub concurrency: usize,
    pub navigation_timeout: Duration,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Execute a crawl with the given options.
/// Returns the discovered in-scope URLs in visit order.
pub async fn execute_crawl(
    options: CrawlOptions,
    renderer: Arc<dyn PageRenderer>,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<Vec<CrawlUrl>> {
    let CrawlOptions {
        base_url,
        max_pages,
        concurrency,
        navigation_timeout,
        show_progress_bars,
    } = options;

    let progress_bar = show_progress_bars.then(|| Arc::new(spinner("Starting crawl...")));
    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let internal_progress_callback: beacon_scanner::crawler::ProgressCallback =
        Arc::new(move |_visited: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!(
                    "Crawling... {} pages ({})",
                    count,
                    extract_url_path(&url)
                ));
            }
            if let Some(ref callback) = progress_callback {
                callback(url);
            }
        });

    let crawler = Crawler::new(renderer)
        .with_max_pages(max_pages)
        .with_concurrency(concurrency)
        .with_navigation_timeout(navigation_timeout)
        .with_progress_callback(internal_progress_callback);

    let result = crawler.crawl(&base_url).await;

    if let Some(ref pb) = progress_bar {
        match result {
            Ok(ref urls) => {
                pb.finish_with_message(format!("Crawl complete! {} pages found", urls.len()))
            }
            Err(_) => pb.finish_and_clear(),
        }
    }

    Ok(result?)
}

/// Generate a crawl report from discovered URLs
pub fn generate_crawl_report(urls: &[CrawlUrl]) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages found: {}\n", urls.len()));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for url in urls {
        report.push_str(&format!("  {}\n", extract_url_path(url.as_str())));
    }

    report
}
