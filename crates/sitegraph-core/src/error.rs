//! Error types for graph construction and interchange parsing

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern `{pattern}` in cluster `{cluster}`: {source}")]
    InvalidPattern {
        cluster: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("malformed graph document: {0}")]
    MalformedDocument(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
