use serde::Deserialize;
use time::OffsetDateTime;

use super::GitHubClient;
use crate::error::ProxyError;
use crate::security::rate_limit::{Quota, QuotaFuture, QuotaProvider};

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: Resources,
}

#[derive(Deserialize)]
struct Resources {
    core: CoreLimit,
}

#[derive(Deserialize)]
struct CoreLimit {
    limit: u32,
    remaining: u32,
    reset: i64,
}

impl GitHubClient {
    /// Current core API quota for `token`.
    pub async fn rate_limit(&self, token: &str) -> Result<Quota, ProxyError> {
        let resp = self
            .get("/rate_limit", token)
            .send()
            .await
            .map_err(|e| ProxyError::Quota(format!("failed to fetch rate limit: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProxyError::Quota(format!("failed to fetch rate limit: {status}")));
        }

        let body: RateLimitResponse = resp
            .json()
            .await
            .map_err(|e| ProxyError::Quota(format!("failed to parse rate limit response: {e}")))?;
        let core = body.resources.core;
        let reset_at = OffsetDateTime::from_unix_timestamp(core.reset)
            .map_err(|e| ProxyError::Quota(format!("invalid reset timestamp: {e}")))?;

        Ok(Quota { limit: core.limit, remaining: core.remaining, reset_at })
    }
}

impl QuotaProvider for GitHubClient {
    type Error = ProxyError;

    fn query<'a>(&'a self, token: &'a str) -> QuotaFuture<'a, ProxyError> {
        Box::pin(self.rate_limit(token))
    }
}
