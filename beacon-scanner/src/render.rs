// Page renderer traits and the HTTP-backed static renderer

use crate::error::{Result, ScanError};
use crate::links::is_crawlable_href;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// No network activity for a short quiet period
    NetworkIdle,
}

#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub timeout: Duration,
    pub wait: WaitCondition,
    /// Disable content-security-policy enforcement so audit scripts can
    /// be injected into restrictive pages.
    pub bypass_csp: bool,
}

impl OpenOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bypass_csp(mut self, bypass: bool) -> Self {
        self.bypass_csp = bypass;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_NAVIGATION_TIMEOUT,
            wait: WaitCondition::NetworkIdle,
            bypass_csp: false,
        }
    }
}

/// A live page handle. Close it on every path once opened.
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// URL the page ended up on after redirects
    fn url(&self) -> &str;

    /// Serialized DOM of the rendered page
    async fn content(&self) -> Result<String>;

    /// Every anchor href on the page, the way the browser exposes
    /// `a.href`: resolved against the document URL. Hrefs that cannot lead
    /// anywhere (empty, `javascript:`, bare fragments) are returned raw.
    async fn extract_links(&self) -> Result<Vec<String>>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(&self, url: &str, options: &OpenOptions) -> Result<Box<dyn RenderedPage>>;
}

/// Renders pages by fetching their markup over HTTP.
///
/// No scripts run, so [`WaitCondition`] is satisfied as soon as the body
/// has been read and CSP bypass has nothing to disable.
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "Beacon/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/beacon)"
            ))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn open(&self, url: &str, options: &OpenOptions) -> Result<Box<dyn RenderedPage>> {
        debug!(
            "Opening {} (wait: {:?}, timeout: {:?}, bypass_csp: {})",
            url, options.wait, options.timeout, options.bypass_csp
        );

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| navigation_error(url, e))?;

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ref ct) = content_type
            && !ct.contains("html")
        {
            return Err(ScanError::navigation(
                url,
                format!("not an HTML document ({})", ct),
            ));
        }

        let html = response.text().await.map_err(|e| navigation_error(url, e))?;

        debug!(
            "Loaded {} -> {} [{}] in {:?}",
            url,
            final_url,
            status_code,
            start.elapsed()
        );

        Ok(Box::new(HtmlPage::new(final_url, html)))
    }
}

fn navigation_error(url: &str, e: reqwest::Error) -> ScanError {
    if e.is_timeout() {
        ScanError::Timeout(url.to_string())
    } else {
        ScanError::navigation(url, e)
    }
}

/// Static markup fetched by [`HttpRenderer`].
#[derive(Debug)]
pub struct HtmlPage {
    url: String,
    html: String,
    closed: bool,
}

impl HtmlPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl RenderedPage for HtmlPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn extract_links(&self) -> Result<Vec<String>> {
        collect_links(&self.html, &self.url)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn collect_links(html: &str, page_url: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let link_selector =
        Selector::parse("a[href]").map_err(|e| ScanError::ParseError(format!("{:?}", e)))?;
    let page_url = Url::parse(page_url).ok();

    let links = document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| {
            if !is_crawlable_href(href) {
                return href.to_string();
            }
            page_url
                .as_ref()
                .and_then(|base| base.join(href).ok())
                .map(|resolved| resolved.to_string())
                .unwrap_or_else(|| href.to_string())
        })
        .collect();

    Ok(links)
}
