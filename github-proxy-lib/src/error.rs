use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur while starting or running the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Upstream client error: {0}")]
    Upstream(String),

    #[error("Credential error: {0}")]
    Credential(#[from] AuthError),

    #[error("Quota query failed: {0}")]
    Quota(String),

    #[error("Private key error: {0}")]
    PrivateKey(String),

    #[error("No private key source found")]
    NoPrivateKey,
}

pub type Result<T> = std::result::Result<T, ProxyError>;
