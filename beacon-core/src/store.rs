// Persisted dataset of page reports, unique by URL

use crate::error::{CoreError, Result};
use beacon_scanner::PageReport;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DATASET_FILE: &str = "accessibility-results.json";

pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Store backed by `<output_dir>/accessibility-results.json`.
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(DATASET_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persisted reports, or an empty dataset when nothing was saved yet.
    pub fn load(&self) -> Result<Vec<PageReport>> {
        if !self.exists() {
            debug!("No dataset at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| CoreError::Persistence {
            path: self.path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let reports: Vec<PageReport> =
            serde_json::from_str(&raw).map_err(|source| CoreError::CorruptDataset {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "Loaded {} existing results from {}",
            reports.len(),
            self.path.display()
        );
        Ok(reports)
    }

    /// Overwrite the dataset with `reports`, creating the directory first.
    pub fn save(&self, reports: &[PageReport]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| CoreError::Persistence {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(reports).map_err(|source| {
            CoreError::CorruptDataset {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, json).map_err(|source| CoreError::Persistence {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved {} results to {}", reports.len(), self.path.display());
        Ok(())
    }

    /// Merge `fresh` into `existing` and write the result. Returns the
    /// merged dataset.
    pub fn checkpoint(
        &self,
        existing: Vec<PageReport>,
        fresh: Vec<PageReport>,
    ) -> Result<Vec<PageReport>> {
        let merged = merge(existing, fresh);
        self.save(&merged)?;
        Ok(merged)
    }
}

pub fn existing_urls(reports: &[PageReport]) -> HashSet<String> {
    reports.iter().map(|r| r.url.clone()).collect()
}

/// Append the reports of `fresh` whose URL is not in `existing` yet.
///
/// `existing` keeps its entries and order; fresh reports keep their
/// relative order and a URL repeated inside `fresh` is only taken once.
pub fn merge(existing: Vec<PageReport>, fresh: Vec<PageReport>) -> Vec<PageReport> {
    let mut seen = existing_urls(&existing);
    let mut merged = existing;

    for report in fresh {
        if seen.insert(report.url.clone()) {
            merged.push(report);
        } else {
            debug!("Skipping duplicate URL: {}", report.url);
        }
    }

    merged
}
