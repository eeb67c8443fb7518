use thiserror::Error;

use crate::core::source::UploadRejection;

/// Central error type for the autosampler-client crate.
#[derive(Debug, Error)]
pub enum ClientError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Domain-specific variants
    #[error("Invalid upload: {0}")]
    InvalidUpload(#[from] UploadRejection),

    #[error("Sample generation failed: {0}")]
    GenerationFailed(String),

    #[error("History fetch failed: {0}")]
    HistoryFetchFailed(String),

    #[error("Download of `{id}` failed: {reason}")]
    DownloadFailed { id: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Anyhow(e.into())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Anyhow(e.into())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(e: toml::de::Error) -> Self {
        ClientError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
