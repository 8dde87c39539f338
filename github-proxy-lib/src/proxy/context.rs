use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::auth::CredentialCache;
use crate::content::ContentFetcher;
use crate::security::RateGate;
use crate::telemetry::Metrics;

/// Shared services every request passes through.
///
/// Cloning is cheap: all services are reference counted.
#[derive(Clone)]
pub struct ProxyContext {
    pub gate: Arc<RateGate>,
    pub credentials: Arc<CredentialCache>,
    pub fetcher: Arc<ContentFetcher>,
    pub shutdown: CancellationToken,
    pub metrics: Option<Arc<Metrics>>,
}

impl ProxyContext {
    pub fn new(
        gate: Arc<RateGate>,
        credentials: Arc<CredentialCache>,
        fetcher: Arc<ContentFetcher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { gate, credentials, fetcher, shutdown, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }
}
