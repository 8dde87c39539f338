use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AuthError, AuthProvider};
use crate::telemetry::Metrics;

/// Subtracted from the upstream expiry to cover clock skew and in-flight requests.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(3 * 60);

/// The shared bearer credential.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: OffsetDateTime,
    effective_expiry: OffsetDateTime,
}

impl Credential {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expiry as reported by the upstream.
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// Upstream expiry minus the safety margin.
    pub fn effective_expiry(&self) -> OffsetDateTime {
        self.effective_expiry
    }

    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now < self.effective_expiry
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("effective_expiry", &self.effective_expiry)
            .finish()
    }
}

/// Self-renewing cache for the single upstream credential.
///
/// Readers take the fast path while the cached credential is valid. Renewal
/// is serialized by `refresh`: at most one mint is in flight, and callers that
/// queued behind it re-check the cache before minting themselves. A failed
/// mint leaves the cache untouched and is not retried here.
pub struct CredentialCache {
    provider: Arc<dyn AuthProvider>,
    safety_margin: time::Duration,
    current: RwLock<Option<Credential>>,
    refresh: Mutex<()>,
    metrics: Option<Arc<Metrics>>,
}

impl CredentialCache {
    pub fn new(provider: Arc<dyn AuthProvider>, safety_margin: Duration) -> Self {
        Self {
            provider,
            safety_margin: time::Duration::try_from(safety_margin).unwrap_or(time::Duration::ZERO),
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Metrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Return a valid token, minting a new one if the cached credential expired.
    pub async fn get(&self) -> Result<String, AuthError> {
        if let Some(token) = self.valid_token() {
            debug!("using cached installation token");
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have renewed while we waited for the lock.
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }

        info!("acquiring new installation token");
        let minted = match self.provider.mint().await {
            Ok(minted) => minted,
            Err(err) => {
                if let Some(m) = &self.metrics {
                    m.record_credential_refresh(false);
                }
                return Err(err);
            }
        };

        let credential = Credential {
            effective_expiry: minted.expires_at - self.safety_margin,
            expires_at: minted.expires_at,
            token: minted.token,
        };
        if !credential.is_valid_at(OffsetDateTime::now_utc()) {
            warn!(
                expires_at = %credential.expires_at,
                "minted token expires within the safety margin"
            );
        }
        info!(expires_at = %credential.expires_at, "installation token renewed");

        let token = credential.token.clone();
        *self.current.write() = Some(credential);

        if let Some(m) = &self.metrics {
            m.record_credential_refresh(true);
        }

        Ok(token)
    }

    /// Snapshot of the cached credential, valid or not.
    pub fn current(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    /// Whether the cache currently holds a credential that needs no renewal.
    pub fn is_valid(&self) -> bool {
        self.valid_token().is_some()
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::try_from(self.safety_margin).unwrap_or(Duration::ZERO)
    }

    fn valid_token(&self) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        self.current
            .read()
            .as_ref()
            .filter(|credential| credential.is_valid_at(now))
            .map(|credential| credential.token.clone())
    }
}
