pub mod aggregate;
pub mod analyzer;
pub mod audit;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod links;
pub mod render;
pub mod result;
pub mod rules;

#[cfg(test)]
mod fakes;

pub use analyzer::{Analyzer, AnalyzerConfig};
pub use audit::{PageAuditor, RawNode, RawViolation};
pub use crawler::Crawler;
pub use error::{Result, ScanError};
pub use links::CrawlUrl;
pub use render::{HttpRenderer, OpenOptions, PageRenderer, RenderedPage};
pub use result::PageReport;
pub use rules::StaticAuditor;
