//! Reasons a peer graph could not be obtained

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no graph document at {0}; the project may not publish one or is not built yet")]
    NotFound(String),

    #[error("I/O error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP {status} fetching {location}")]
    Status { location: String, status: u16 },

    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("network error fetching {location}: {source}")]
    Transport {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid graph document at {location}: {source}")]
    Document {
        location: String,
        #[source]
        source: sitegraph_core::GraphError,
    },
}
