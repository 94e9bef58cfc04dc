use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("page count must be between 1 and {max}, got {got}")]
    InvalidPageCount { got: u32, max: u32 },

    /// A listing page could not be retrieved or read.
    #[error("failed to fetch page {page} ({url}): {reason}")]
    Fetch { page: u32, url: String, reason: String },

    /// Saved dataset missing or unreadable.
    #[error("dataset {} unavailable: {reason}", path.display())]
    DatasetUnavailable { path: PathBuf, reason: String },

    #[error("dataset write failed: {0}")]
    Dataset(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
