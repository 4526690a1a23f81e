//! Fetching published graph documents from peer projects

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use sitegraph_core::paths::{is_url, trim_trailing_slash};
use sitegraph_core::{GraphDocument, Project};

use crate::error::FetchError;

/// Upper bound for one peer fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// File name a project publishes its graph under.
pub const DEFAULT_DOCUMENT: &str = "graph.json";

/// Where a peer publishes its graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerLocation {
    pub project: String,
    /// URL or absolute directory, without trailing slash.
    pub base: String,
    /// Document path relative to `base`.
    pub document: String,
}

impl PeerLocation {
    pub fn new(project: impl Into<String>, base: &str, document: impl Into<String>) -> Self {
        PeerLocation {
            project: project.into(),
            base: trim_trailing_slash(base).to_string(),
            document: document.into(),
        }
    }

    /// Location for a configured project. Relative local bases are taken
    /// relative to `source_dir`.
    pub fn resolve(project: &Project, source_dir: &Path, document: &str) -> Self {
        let base = trim_trailing_slash(&project.base_url);
        if is_url(base) {
            return PeerLocation::new(&project.name, base, document);
        }
        let path = Path::new(base);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            source_dir.join(path)
        };
        let normalized = normalize_local(&absolute);
        PeerLocation::new(&project.name, &normalized.to_string_lossy(), document)
    }

    pub fn is_remote(&self) -> bool {
        self.base.starts_with("http://") || self.base.starts_with("https://")
    }

    /// Directory on disk for local peers.
    pub fn local_dir(&self) -> Option<PathBuf> {
        if self.is_remote() {
            return None;
        }
        let dir = self.base.strip_prefix("file://").unwrap_or(&self.base);
        Some(PathBuf::from(dir))
    }

    /// Full location of the published document.
    pub fn document_location(&self) -> String {
        format!("{}/{}", self.base, self.document.trim_start_matches('/'))
    }
}

fn normalize_local(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Source of peer graph documents.
#[async_trait::async_trait]
pub trait GraphSource: Send + Sync {
    async fn fetch(&self, peer: &PeerLocation) -> Result<GraphDocument, FetchError>;
}

/// Reads local peers from disk and remote peers over HTTP.
pub struct DefaultSource {
    client: reqwest::Client,
    timeout: Duration,
}

impl DefaultSource {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self { client, timeout }
    }

    async fn fetch_remote(&self, location: String) -> Result<GraphDocument, FetchError> {
        let transport = |source: reqwest::Error, location: &str| {
            if source.is_timeout() {
                FetchError::Timeout(location.to_string())
            } else {
                FetchError::Transport {
                    location: location.to_string(),
                    source,
                }
            }
        };

        let request = self.client.get(&location).send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(location.clone()))?
            .map_err(|e| transport(e, &location))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(location));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                location,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| transport(e, &location))?;
        GraphDocument::from_slice(&body).map_err(|source| FetchError::Document { location, source })
    }

    async fn fetch_local(&self, dir: PathBuf, document: &str) -> Result<GraphDocument, FetchError> {
        let path = dir.join(document.trim_start_matches('/'));
        let location = path.display().to_string();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(FetchError::NotFound(location)),
            Err(source) => return Err(FetchError::Io { location, source }),
        };
        GraphDocument::from_slice(&bytes).map_err(|source| FetchError::Document { location, source })
    }
}

impl Default for DefaultSource {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl GraphSource for DefaultSource {
    async fn fetch(&self, peer: &PeerLocation) -> Result<GraphDocument, FetchError> {
        tracing::debug!("Fetching graph for '{}' from {}", peer.project, peer.document_location());
        match peer.local_dir() {
            Some(dir) => self.fetch_local(dir, &peer.document).await,
            None => self.fetch_remote(peer.document_location()).await,
        }
    }
}
