//! Two-tier admission: one process-wide bucket sized from the upstream quota,
//! then the per-client registry.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::info;

use super::{ClientLimiterRegistry, TokenBucket};

/// Upstream quota window as reported at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: OffsetDateTime,
}

/// Boxed future returned by [`QuotaProvider::query`].
pub type QuotaFuture<'a, E> = Pin<Box<dyn Future<Output = Result<Quota, E>> + Send + 'a>>;

/// Source of the upstream quota window, consulted once at startup.
pub trait QuotaProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn query<'a>(&'a self, token: &'a str) -> QuotaFuture<'a, Self::Error>;
}

/// Outcome of one admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionResult {
    Admitted,
    GlobalLimited,
    ClientLimited,
}

impl AdmissionResult {
    pub fn is_admitted(self) -> bool {
        matches!(self, AdmissionResult::Admitted)
    }

    /// Label naming the tier that rejected the request.
    pub fn scope(self) -> &'static str {
        match self {
            AdmissionResult::Admitted => "none",
            AdmissionResult::GlobalLimited => "global",
            AdmissionResult::ClientLimited => "client",
        }
    }
}

/// Global bucket in front of the per-client registry.
///
/// A global token taken for a request that the client tier then rejects is
/// not given back: throttled clients still drain shared capacity.
pub struct RateGate {
    global: TokenBucket,
    clients: Arc<ClientLimiterRegistry>,
}

impl RateGate {
    pub fn new(global: TokenBucket, clients: Arc<ClientLimiterRegistry>) -> Self {
        Self { global, clients }
    }

    /// Size the global bucket so `quota.limit` requests spread evenly until
    /// `quota.reset_at`. The bucket is not resynchronized afterwards.
    ///
    /// A reset time at or before `now` is treated as one second away.
    pub fn from_quota(
        quota: &Quota,
        now: OffsetDateTime,
        clients: Arc<ClientLimiterRegistry>,
    ) -> Self {
        let window = quota_window(quota, now);
        let global = TokenBucket::per_period(quota.limit, quota.limit, window);
        info!(
            limit = quota.limit,
            remaining = quota.remaining,
            window_secs = window.as_secs(),
            "global rate limit set to {} requests per window",
            quota.limit
        );
        Self::new(global, clients)
    }

    /// Query `provider` with `token` and build the gate from the answer.
    pub async fn from_provider<P: QuotaProvider + ?Sized>(
        provider: &P,
        token: &str,
        clients: Arc<ClientLimiterRegistry>,
    ) -> Result<Self, P::Error> {
        let quota = provider.query(token).await?;
        Ok(Self::from_quota(&quota, OffsetDateTime::now_utc(), clients))
    }

    pub fn allow(&self, client_key: &str) -> AdmissionResult {
        self.allow_at(client_key, Instant::now())
    }

    pub fn allow_at(&self, client_key: &str, now: Instant) -> AdmissionResult {
        if !self.global.allow_at(now) {
            return AdmissionResult::GlobalLimited;
        }
        if !self.clients.allow_at(client_key, now) {
            return AdmissionResult::ClientLimited;
        }
        AdmissionResult::Admitted
    }

    pub fn global(&self) -> &TokenBucket {
        &self.global
    }

    pub fn clients(&self) -> &Arc<ClientLimiterRegistry> {
        &self.clients
    }
}

fn quota_window(quota: &Quota, now: OffsetDateTime) -> Duration {
    let window = quota.reset_at - now;
    if window.whole_seconds() < 1 {
        return Duration::from_secs(1);
    }
    Duration::try_from(window).unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_window_in_past_clamps() {
        let now = OffsetDateTime::now_utc();
        let quota = Quota { limit: 10, remaining: 0, reset_at: now - time::Duration::minutes(5) };
        assert_eq!(quota_window(&quota, now), Duration::from_secs(1));
    }

    #[test]
    fn test_quota_window_spreads_limit() {
        let now = OffsetDateTime::now_utc();
        let quota = Quota { limit: 5000, remaining: 4999, reset_at: now + time::Duration::hours(1) };
        assert_eq!(quota_window(&quota, now), Duration::from_secs(3600));
    }
}
