// Shared in-memory site for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use beacon_scanner::render::HtmlPage;
use beacon_scanner::{OpenOptions, PageRenderer, RenderedPage, ScanError};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BASE: &str = "http://site.test";

/// Markup that passes every built-in rule
pub fn clean_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{0}">Go to {0}</a>"#, href))
        .collect();
    format!(
        r#"<html lang="en"><head><title>Page</title></head><body><h1>Heading</h1>{}</body></html>"#,
        anchors
    )
}

/// Markup with one image-alt failure
pub fn page_with_missing_alt(links: &[&str]) -> String {
    clean_page(links).replace("<h1>", r#"<img src="logo.png"><h1>"#)
}

#[derive(Default)]
pub struct SiteRenderer {
    pages: HashMap<String, String>,
    broken: HashSet<String>,
    opens: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl SiteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, html: String) -> Self {
        self.pages.insert(format!("{}{}", BASE, path), html);
        self
    }

    /// Every open of `path` fails
    pub fn broken(mut self, path: &str) -> Self {
        self.broken.insert(format!("{}{}", BASE, path));
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for SiteRenderer {
    async fn open(
        &self,
        url: &str,
        _options: &OpenOptions,
    ) -> beacon_scanner::Result<Box<dyn RenderedPage>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.opened.lock().unwrap().push(url.to_string());

        if self.broken.contains(url) {
            return Err(ScanError::navigation(url, "net::ERR_CONNECTION_REFUSED"));
        }

        let html = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScanError::navigation(url, "404"))?;
        Ok(Box::new(HtmlPage::new(url, html)))
    }
}
