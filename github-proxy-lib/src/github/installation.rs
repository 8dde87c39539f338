use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::GitHubClient;
use crate::auth::{AppKey, AuthError, AuthProvider, MintFuture, MintedToken};

/// Lifetime assumed when GitHub omits `expires_at`.
const DEFAULT_TOKEN_TTL: Duration = Duration::hours(1);

#[derive(Deserialize)]
struct AccessTokenResponse {
    token: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    expires_at: Option<OffsetDateTime>,
}

/// Mints installation access tokens for a GitHub App.
pub struct GitHubAppAuth {
    client: GitHubClient,
    key: AppKey,
    installation_id: String,
}

impl GitHubAppAuth {
    pub fn new(client: GitHubClient, key: AppKey, installation_id: impl Into<String>) -> Self {
        Self { client, key, installation_id: installation_id.into() }
    }

    async fn request_token(&self) -> Result<MintedToken, AuthError> {
        let now = OffsetDateTime::now_utc();
        let assertion = self.key.sign_assertion(now)?;
        let path = format!("/app/installations/{}/access_tokens", self.installation_id);

        debug!(installation_id = %self.installation_id, "requesting installation token");
        let resp = self
            .client
            .post(&path, &assertion)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        if status != reqwest::StatusCode::CREATED {
            return Err(AuthError::Status(status.as_u16()));
        }

        let body: AccessTokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        Ok(MintedToken {
            token: body.token,
            expires_at: body.expires_at.unwrap_or(now + DEFAULT_TOKEN_TTL),
        })
    }
}

impl AuthProvider for GitHubAppAuth {
    fn mint(&self) -> MintFuture<'_> {
        Box::pin(self.request_token())
    }
}
