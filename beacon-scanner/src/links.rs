// URL canonicalization and crawler link filters

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use url::Url;

/// File extensions that are never queued for a visit.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".mp4", ".mp3",
];

/// A canonicalized absolute URL. Identity is string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawlUrl(String);

impl CrawlUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CrawlUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CrawlUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CrawlUrl> for String {
    fn from(url: CrawlUrl) -> Self {
        url.0
    }
}

/// Resolve `link` against `base_url` and canonicalize the result.
///
/// Query string and fragment are always dropped. Scheme and host come back
/// lower-cased and a default port (80 for http, 443 for https) is removed.
/// Returns `None` when either side cannot be parsed; the failure is logged
/// and the caller carries on.
pub fn normalize(link: &str, base_url: &str) -> Option<CrawlUrl> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            warn!("Error normalizing URL: {} (base {}: {})", link, base_url, e);
            return None;
        }
    };

    let mut resolved = match base.join(link) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Error normalizing URL: {} ({})", link, e);
            return None;
        }
    };

    resolved.set_query(None);
    resolved.set_fragment(None);

    Some(CrawlUrl(resolved.to_string()))
}

/// Textual prefix check against the normalized base. Not path-segment
/// aware: `http://a.com/doc` is in scope of `http://a.com/do`.
pub fn is_in_scope(url: &str, base_url: &str) -> bool {
    match normalize("", base_url) {
        Some(base) => url.starts_with(base.as_str()),
        None => false,
    }
}

/// Loose media check: any listed extension anywhere in the URL, ignoring case.
pub fn is_media_file(url: &str) -> bool {
    let lowered = url.to_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| lowered.contains(ext))
}

/// Hrefs that never lead to a page: empty, `javascript:` and in-page anchors.
pub fn is_crawlable_href(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty() || href.starts_with("javascript:") || href.starts_with('#'))
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}
