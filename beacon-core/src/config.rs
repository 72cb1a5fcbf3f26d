// Run configuration from a JSON file with command line overrides

use crate::error::{CoreError, Result};
use beacon_scanner::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "webAccessibility-config.json";
pub const DEFAULT_OUTPUT_DIR: &str = "accessibility-results";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    pub base_url: String,

    /// When non-empty, these paths are appended to `base_url` and analyzed
    /// directly instead of crawling.
    #[serde(default)]
    pub relative_paths: Vec<String>,

    #[serde(default)]
    pub max_pages_to_visit: Option<usize>,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

fn default_concurrency() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_formats() -> Vec<String> {
    vec!["json".to_string(), "html".to_string()]
}

/// Values given on the command line. `None` keeps the file's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub max_pages: Option<usize>,
    pub concurrency: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl AuditConfig {
    /// A config with every optional field at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            relative_paths: Vec::new(),
            max_pages_to_visit: None,
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            formats: default_formats(),
        }
    }

    /// Read and validate a config file. `~` in the path is expanded.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let expanded = expand_path(path);
        let raw = fs::read_to_string(&expanded).map_err(|source| CoreError::ConfigIo {
            path: expanded.clone(),
            source,
        })?;

        let config: AuditConfig =
            serde_json::from_str(&raw).map_err(|source| CoreError::ConfigParse {
                path: expanded.clone(),
                source,
            })?;

        Ok(config)
    }

    /// Load from `path` when it exists; otherwise build from the overrides
    /// alone, which then must carry a base URL.
    pub fn load_or_overrides(path: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let expanded = expand_path(path);
        let config = if expanded.exists() {
            let mut config = Self::read(&expanded)?;
            config.apply_overrides(overrides);
            config
        } else {
            let base_url = overrides.base_url.clone().ok_or_else(|| {
                CoreError::Config(format!(
                    "{} not found and no --base-url given",
                    expanded.display()
                ))
            })?;
            let mut config = Self::new(base_url);
            config.apply_overrides(overrides);
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref base_url) = overrides.base_url {
            self.base_url = base_url.clone();
        }
        if overrides.max_pages.is_some() {
            self.max_pages_to_visit = overrides.max_pages;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(ref output_dir) = overrides.output_dir {
            self.output_dir = output_dir.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CoreError::Config("baseUrl must not be empty".to_string()));
        }
        Url::parse(&self.base_url).map_err(|e| {
            CoreError::Config(format!("baseUrl '{}' is not a valid URL: {}", self.base_url, e))
        })?;
        if self.concurrency == 0 {
            return Err(CoreError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute URLs to analyze in relative-path mode, in configured order.
    /// Plain concatenation, so `baseUrl` should not end with `/` when the
    /// paths start with one.
    pub fn relative_urls(&self) -> Vec<String> {
        self.relative_paths
            .iter()
            .map(|path| format!("{}{}", self.base_url, path))
            .collect()
    }

    pub fn uses_relative_paths(&self) -> bool {
        !self.relative_paths.is_empty()
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            concurrency: self.concurrency,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            navigation_timeout: self.navigation_timeout(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_path(&self.output_dir)
    }
}

pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: AuditConfig =
            serde_json::from_str(r#"{ "baseUrl": "https://example.com" }"#).unwrap();

        assert_eq!(config, AuditConfig::new("https://example.com"));
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.max_pages_to_visit, None);
        assert_eq!(config.output_dir, PathBuf::from("accessibility-results"));
        assert_eq!(config.formats, vec!["json", "html"]);
    }

    #[test]
    fn test_validate_rejects_blank_base_url() {
        let err = AuditConfig::new("   ").validate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_rejects_unparseable_base_url() {
        assert!(AuditConfig::new("not a url").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = AuditConfig::new("https://example.com");
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_urls_concatenate() {
        let mut config = AuditConfig::new("https://example.com");
        config.relative_paths = vec!["/".to_string(), "/about".to_string()];

        assert!(config.uses_relative_paths());
        assert_eq!(
            config.relative_urls(),
            vec!["https://example.com/", "https://example.com/about"]
        );
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut config = AuditConfig::new("https://example.com");
        config.max_pages_to_visit = Some(50);

        config.apply_overrides(&ConfigOverrides {
            concurrency: Some(8),
            ..Default::default()
        });

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.max_pages_to_visit, Some(50));
        assert_eq!(config.base_url, "https://example.com");
    }

    #[test]
    fn test_analyzer_config_conversion() {
        let mut config = AuditConfig::new("https://example.com");
        config.retry_delay_ms = 250;
        config.navigation_timeout_secs = 10;

        let analyzer = config.analyzer_config();
        assert_eq!(analyzer.retry_delay, Duration::from_millis(250));
        assert_eq!(analyzer.navigation_timeout, Duration::from_secs(10));
        assert_eq!(analyzer.max_retries, 3);
    }
}
