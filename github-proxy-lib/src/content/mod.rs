//! File retrieval from the upstream content API.

pub mod mime;

pub use mime::{resolve_content_type, DEFAULT_CONTENT_TYPE};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::telemetry::Metrics;

/// Payloads larger than this are downloaded instead of decoded inline.
pub const INLINE_THRESHOLD: u64 = 1024 * 1024;

/// Describes things that can go wrong while fetching a file
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("File not found upstream")]
    NotFound,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Failed to decode file content: {0}")]
    Decode(String),

    #[error("Failed to reach upstream: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound => "not_found",
            FetchError::Upstream(_) => "upstream",
            FetchError::Decode(_) => "decode",
            FetchError::Transport(_) => "transport",
        }
    }
}

/// Metadata the upstream reports for a single file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub encoding: Option<String>,
    /// Encoded payload, present for small files.
    #[serde(default, rename = "content")]
    pub inline_payload: Option<String>,
    /// Direct download reference.
    #[serde(default, rename = "download_url")]
    pub download_ref: Option<String>,
}

/// Boxed future returned by [`ContentProvider`] operations.
pub type ContentFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Upstream file storage addressed by owner, repository and path.
pub trait ContentProvider: Send + Sync {
    fn get_metadata<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        path: &'a str,
        token: &'a str,
    ) -> ContentFuture<'a, FileMetadata>;

    fn download<'a>(&'a self, download_ref: &'a str, token: &'a str) -> ContentFuture<'a, Bytes>;
}

/// How the payload was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    Inline,
    Download,
}

impl RetrievalStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            RetrievalStrategy::Inline => "inline",
            RetrievalStrategy::Download => "download",
        }
    }
}

/// A retrieved file ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub name: String,
    pub bytes: Bytes,
    pub content_type: String,
    pub strategy: RetrievalStrategy,
}

/// Retrieves file bytes and resolves their content type.
pub struct ContentFetcher {
    provider: Arc<dyn ContentProvider>,
    inline_threshold: u64,
    metrics: Option<Arc<Metrics>>,
}

impl ContentFetcher {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider, inline_threshold: INLINE_THRESHOLD, metrics: None }
    }

    pub fn with_inline_threshold(mut self, threshold: u64) -> Self {
        self.inline_threshold = threshold;
        self
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
    ) -> Result<FetchedContent, FetchError> {
        let metadata = self.provider.get_metadata(owner, repo, path, token).await;
        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(err) => {
                self.record("metadata", Err(&err));
                return Err(err);
            }
        };

        let strategy = if metadata.size > self.inline_threshold {
            RetrievalStrategy::Download
        } else {
            RetrievalStrategy::Inline
        };

        let bytes = match strategy {
            RetrievalStrategy::Download => self.download(&metadata, token).await,
            RetrievalStrategy::Inline => decode_inline(&metadata),
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(err) => {
                self.record(strategy.as_str(), Err(&err));
                return Err(err);
            }
        };
        self.record(strategy.as_str(), Ok(()));

        let content_type = resolve_content_type(&metadata.name, &bytes);
        info!(
            file = %metadata.name,
            size = metadata.size,
            content_type = %content_type,
            strategy = strategy.as_str(),
            "serving file"
        );

        Ok(FetchedContent { name: metadata.name, bytes, content_type, strategy })
    }

    async fn download(&self, metadata: &FileMetadata, token: &str) -> Result<Bytes, FetchError> {
        let download_ref = metadata
            .download_ref
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                FetchError::Upstream(format!("no download reference for {}", metadata.name))
            })?;
        debug!(file = %metadata.name, size = metadata.size, "downloading large file");
        self.provider.download(download_ref, token).await
    }

    fn record(&self, strategy: &str, result: Result<(), &FetchError>) {
        if let Some(m) = &self.metrics {
            let outcome = match result {
                Ok(()) => "ok",
                Err(err) => err.kind(),
            };
            m.record_upstream_fetch(strategy, outcome);
        }
    }
}

/// Decode the base64 inline payload, ignoring the line breaks GitHub inserts.
pub fn decode_inline(metadata: &FileMetadata) -> Result<Bytes, FetchError> {
    match metadata.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => {
            return Err(FetchError::Decode(format!("unsupported encoding: {other}")));
        }
    }

    let payload = metadata
        .inline_payload
        .as_deref()
        .ok_or_else(|| FetchError::Decode("missing inline content".to_string()))?;
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD
        .decode(compact.as_bytes())
        .map(Bytes::from)
        .map_err(|e| FetchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(encoding: Option<&str>, payload: Option<&str>) -> FileMetadata {
        FileMetadata {
            name: "README.md".to_string(),
            size: 13,
            encoding: encoding.map(str::to_string),
            inline_payload: payload.map(str::to_string),
            download_ref: None,
        }
    }

    #[test]
    fn test_decode_with_line_breaks() {
        let meta = metadata(Some("base64"), Some("SGVsbG8s\nIFdvcmxk\nIQ==\n"));
        assert_eq!(decode_inline(&meta), Ok(Bytes::from_static(b"Hello, World!")));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let meta = metadata(Some("base64"), Some("@@not base64@@"));
        assert!(matches!(decode_inline(&meta), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        let meta = metadata(Some("none"), Some(""));
        assert!(matches!(decode_inline(&meta), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_payload() {
        let meta = metadata(Some("base64"), None);
        assert!(matches!(decode_inline(&meta), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_metadata_from_github_json() -> Result<(), serde_json::Error> {
        let meta: FileMetadata = serde_json::from_str(
            r#"{"type":"file","name":"README.md","path":"README.md","size":13,
                "encoding":"base64","content":"SGVsbG8sIFdvcmxkIQ==",
                "download_url":"https://raw.githubusercontent.com/octocat/Hello-World/master/README.md"}"#,
        )?;
        assert_eq!(meta.name, "README.md");
        assert_eq!(meta.size, 13);
        assert_eq!(meta.inline_payload.as_deref(), Some("SGVsbG8sIFdvcmxkIQ=="));
        assert!(meta.download_ref.is_some());
        Ok(())
    }
}
