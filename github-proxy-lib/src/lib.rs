#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod github;
pub mod proxy;
pub mod security;
pub mod telemetry;

pub use auth::{AppKey, AuthError, AuthProvider, CredentialCache, KeySource};
pub use config::{load_from_path, Config};
pub use content::{ContentFetcher, ContentProvider, FetchError, FetchedContent};
pub use error::{ProxyError, Result};
pub use github::{GitHubAppAuth, GitHubClient};
pub use proxy::{handle_request, run, serve, HttpError, ProxyContext, ServerLimits};
pub use security::{ClientLimiterRegistry, RateGate, TokenBucket};
