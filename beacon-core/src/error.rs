use beacon_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot access results at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt results file {path}: {source}")]
    CorruptDataset {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl CoreError {
    /// Configuration problems stop a run before any page is loaded.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_) | CoreError::ConfigIo { .. } | CoreError::ConfigParse { .. }
        )
    }

    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            CoreError::Persistence { .. } | CoreError::CorruptDataset { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
