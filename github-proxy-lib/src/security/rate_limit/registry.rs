//! Per-client token buckets keyed by derived client identity.

use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::TokenBucket;
use crate::telemetry::Metrics;

struct ClientEntry {
    bucket: TokenBucket,
    last_seen: Instant,
}

/// Registry of per-client limiters.
///
/// Entries are created lazily on the first request from a key and evicted by
/// [`ClientLimiterRegistry::sweep`] once idle for longer than the TTL. One lock
/// covers lookup, insert, update and the whole sweep scan, so a check issued
/// during a sweep waits for the scan to finish.
pub struct ClientLimiterRegistry {
    capacity: u32,
    refill_per_sec: f64,
    clients: Mutex<AHashMap<String, ClientEntry>>,
    metrics: Option<Arc<Metrics>>,
}

impl ClientLimiterRegistry {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self { capacity, refill_per_sec, clients: Mutex::new(AHashMap::new()), metrics: None }
    }

    /// Build a registry whose clients may burst `burst` requests and then
    /// sustain `per_minute` requests per minute.
    pub fn per_minute(burst: u32, per_minute: u32) -> Self {
        Self::new(burst, f64::from(per_minute) / 60.0)
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Admission check for `key` at `now`; creates the entry on first sight.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock();

        if let Some(entry) = clients.get_mut(key) {
            entry.last_seen = now;
            return entry.bucket.allow_at(now);
        }

        let bucket = TokenBucket::new(self.capacity, self.refill_per_sec);
        let allowed = bucket.allow_at(now);
        clients.insert(key.to_string(), ClientEntry { bucket, last_seen: now });
        debug!(
            client = %key,
            burst = self.capacity,
            per_minute = self.refill_per_sec * 60.0,
            "client rate limiter created"
        );
        self.record_active(clients.len());

        allowed
    }

    /// Remove every entry idle for longer than `idle_ttl`. Returns how many were evicted.
    pub fn sweep(&self, idle_ttl: Duration) -> usize {
        self.sweep_at(idle_ttl, Instant::now())
    }

    pub fn sweep_at(&self, idle_ttl: Duration, now: Instant) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= idle_ttl);
        let evicted = before.saturating_sub(clients.len());
        self.record_active(clients.len());
        evicted
    }

    pub fn contains(&self, key: &str) -> bool {
        self.clients.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run [`Self::sweep`] every `interval` until `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        idle_ttl: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            info!(
                interval_secs = interval.as_secs(),
                idle_ttl_secs = idle_ttl.as_secs(),
                "client limiter sweeper started"
            );
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        let evicted = registry.sweep(idle_ttl);
                        debug!(evicted, remaining = registry.len(), "client limiters swept");
                    }
                }
            }
            info!("client limiter sweeper stopped");
        })
    }

    fn record_active(&self, active: usize) {
        if let Some(m) = &self.metrics {
            m.record_client_limiters_active(active);
        }
    }
}
