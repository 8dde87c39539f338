//! Shared fakes for integration tests

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use github_proxy_lib::auth::{AuthError, AuthProvider, MintFuture, MintedToken};
use github_proxy_lib::content::{ContentFuture, ContentProvider, FetchError, FileMetadata};
use github_proxy_lib::{
    ClientLimiterRegistry, ContentFetcher, CredentialCache, ProxyContext, RateGate, TokenBucket,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub const SAFETY_MARGIN: Duration = Duration::from_secs(180);

pub fn peer() -> SocketAddr {
    SocketAddr::from(([203, 0, 113, 7], 51234))
}

/// Auth provider counting its mint calls.
pub struct FakeAuth {
    mints: AtomicUsize,
    fail: bool,
    ttl: time::Duration,
    delay: Duration,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self { mints: AtomicUsize::new(0), fail: false, ttl: time::Duration::hours(1), delay: Duration::ZERO }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new() }
    }

    pub fn with_ttl(mut self, ttl: time::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn mints(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }
}

impl AuthProvider for FakeAuth {
    fn mint(&self) -> MintFuture<'_> {
        Box::pin(async move {
            let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AuthError::Status(401));
            }
            Ok(MintedToken {
                token: format!("ghs_token_{n}"),
                expires_at: OffsetDateTime::now_utc() + self.ttl,
            })
        })
    }
}

/// In-memory content store keyed by `owner/repo/path`.
#[derive(Default)]
pub struct FakeContent {
    files: HashMap<String, FileMetadata>,
    downloads: HashMap<String, Bytes>,
    metadata_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, key: &str, metadata: FileMetadata) -> Self {
        self.files.insert(key.to_string(), metadata);
        self
    }

    pub fn with_download(mut self, download_ref: &str, bytes: &'static [u8]) -> Self {
        self.downloads.insert(download_ref.to_string(), Bytes::from_static(bytes));
        self
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

impl ContentProvider for FakeContent {
    fn get_metadata<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        path: &'a str,
        _token: &'a str,
    ) -> ContentFuture<'a, FileMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.files.get(&format!("{owner}/{repo}/{path}")).cloned();
        Box::pin(async move { found.ok_or(FetchError::NotFound) })
    }

    fn download<'a>(&'a self, download_ref: &'a str, _token: &'a str) -> ContentFuture<'a, Bytes> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.downloads.get(download_ref).cloned();
        Box::pin(async move { found.ok_or(FetchError::NotFound) })
    }
}

/// Metadata for a small file, base64 encoded with GitHub's 60 column line breaks.
pub fn inline_file(name: &str, body: &[u8]) -> FileMetadata {
    let encoded = STANDARD.encode(body);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    FileMetadata {
        name: name.to_string(),
        size: body.len() as u64,
        encoding: Some("base64".to_string()),
        inline_payload: Some(wrapped),
        download_ref: Some(format!("https://raw.example.test/{name}")),
    }
}

/// Metadata for a file only reachable through its download reference.
pub fn large_file(name: &str, size: u64, download_ref: &str) -> FileMetadata {
    FileMetadata {
        name: name.to_string(),
        size,
        encoding: Some("none".to_string()),
        inline_payload: Some(String::new()),
        download_ref: Some(download_ref.to_string()),
    }
}

/// A gate with plenty of global and per-client capacity.
pub fn open_gate() -> RateGate {
    RateGate::new(
        TokenBucket::new(1_000, 1_000.0),
        Arc::new(ClientLimiterRegistry::per_minute(100, 6_000)),
    )
}

pub struct Harness {
    pub ctx: ProxyContext,
    pub auth: Arc<FakeAuth>,
    pub content: Arc<FakeContent>,
}

pub fn harness(auth: FakeAuth, content: FakeContent, gate: RateGate) -> Harness {
    let auth = Arc::new(auth);
    let content = Arc::new(content);
    let credentials = Arc::new(CredentialCache::new(auth.clone(), SAFETY_MARGIN));
    let fetcher = Arc::new(ContentFetcher::new(content.clone()));
    let ctx = ProxyContext::new(Arc::new(gate), credentials, fetcher, CancellationToken::new());
    Harness { ctx, auth, content }
}
