use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Navigation to {0} timed out")]
    Timeout(String),

    #[error("Audit of {url} failed: {reason}")]
    Audit { url: String, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        ScanError::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn audit(url: impl Into<String>, reason: impl ToString) -> Self {
        ScanError::Audit {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
