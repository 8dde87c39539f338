//! Upstream bearer credentials.
//!
//! [`AuthProvider`] mints a fresh installation token; [`CredentialCache`]
//! holds the single shared token and renews it through the provider when it
//! nears expiry.

pub mod app;
pub mod cache;

pub use app::{AppKey, KeySource, PRIVATE_KEY_ENV};
pub use cache::{Credential, CredentialCache, DEFAULT_SAFETY_MARGIN};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors raised while minting a credential
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Failed to sign application assertion: {0}")]
    Signing(String),

    #[error("Failed to reach token endpoint: {0}")]
    Transport(String),

    #[error("Token endpoint returned status {0}")]
    Status(u16),

    #[error("Failed to parse token response: {0}")]
    Decode(String),
}

/// A freshly minted token and the absolute expiry reported by the upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct MintedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl std::fmt::Debug for MintedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Boxed future returned by [`AuthProvider::mint`].
pub type MintFuture<'a> = Pin<Box<dyn Future<Output = Result<MintedToken, AuthError>> + Send + 'a>>;

/// Capability that mints a new upstream bearer credential.
pub trait AuthProvider: Send + Sync {
    fn mint(&self) -> MintFuture<'_>;
}
