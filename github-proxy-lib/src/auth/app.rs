//! GitHub App identity: private key loading and JWT signing.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};

use super::AuthError;
use crate::error::{ProxyError, Result};

/// Environment variable consulted when no key file is configured.
pub const PRIVATE_KEY_ENV: &str = "GH_PRIVATE_KEY";

/// GitHub rejects assertions valid for longer than ten minutes.
const ASSERTION_TTL: Duration = Duration::minutes(10);
/// Backdate `iat` to tolerate clock drift against GitHub.
const ASSERTION_BACKDATE: Duration = Duration::seconds(60);

/// Where the App private key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    File(PathBuf),
    Env(String),
}

impl KeySource {
    /// Pick the key source: an explicit file first, then [`PRIVATE_KEY_ENV`].
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Ok(KeySource::File(path.to_path_buf()));
        }
        match std::env::var(PRIVATE_KEY_ENV) {
            Ok(value) if !value.is_empty() => Ok(KeySource::Env(PRIVATE_KEY_ENV.to_string())),
            _ => Err(ProxyError::NoPrivateKey),
        }
    }

    fn read(&self) -> Result<Vec<u8>> {
        match self {
            KeySource::File(path) => fs::read(path).map_err(|e| {
                ProxyError::PrivateKey(format!("failed to read {}: {e}", path.display()))
            }),
            KeySource::Env(name) => match std::env::var(name) {
                Ok(value) if !value.is_empty() => Ok(value.into_bytes()),
                _ => Err(ProxyError::PrivateKey(format!("{name} environment variable is empty"))),
            },
        }
    }
}

#[derive(Serialize)]
struct AppClaims<'a> {
    iat: i64,
    exp: i64,
    iss: &'a str,
}

/// Signing identity of the GitHub App.
#[derive(Clone)]
pub struct AppKey {
    client_id: String,
    key: EncodingKey,
}

impl AppKey {
    /// Parse a PEM encoded RSA private key (PKCS#1 or PKCS#8).
    pub fn from_pem(client_id: impl Into<String>, pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| ProxyError::PrivateKey(format!("failed to parse private key: {e}")))?;
        Ok(Self { client_id: client_id.into(), key })
    }

    pub fn load(client_id: impl Into<String>, source: &KeySource) -> Result<Self> {
        let pem = source.read()?;
        Self::from_pem(client_id, &pem)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sign the short-lived assertion used to request installation tokens.
    pub fn sign_assertion(&self, now: OffsetDateTime) -> std::result::Result<String, AuthError> {
        let claims = AppClaims {
            iat: (now - ASSERTION_BACKDATE).unix_timestamp(),
            exp: (now + ASSERTION_TTL).unix_timestamp(),
            iss: &self.client_id,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppKey")
            .field("client_id", &self.client_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn fixture_pem() -> String {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/app_key.pem");
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
    }

    #[test]
    #[serial]
    fn test_env_key_is_used_without_path() {
        std::env::set_var(PRIVATE_KEY_ENV, fixture_pem());
        let source = KeySource::resolve(None);
        let loaded = match &source {
            Ok(source) => AppKey::load("Iv1.test", source).map(|key| key.client_id().to_string()),
            Err(_) => Err(ProxyError::NoPrivateKey),
        };
        std::env::remove_var(PRIVATE_KEY_ENV);

        assert!(matches!(&source, Ok(KeySource::Env(name)) if name == PRIVATE_KEY_ENV));
        assert!(matches!(loaded, Ok(ref id) if id == "Iv1.test"));
    }

    #[test]
    #[serial]
    fn test_missing_key_source_is_fatal() {
        std::env::remove_var(PRIVATE_KEY_ENV);
        assert!(matches!(KeySource::resolve(None), Err(ProxyError::NoPrivateKey)));
    }

    #[test]
    #[serial]
    fn test_empty_env_key_is_fatal() {
        std::env::set_var(PRIVATE_KEY_ENV, "");
        let source = KeySource::resolve(None);
        std::env::remove_var(PRIVATE_KEY_ENV);

        assert!(matches!(source, Err(ProxyError::NoPrivateKey)));
    }

    #[test]
    fn test_explicit_path_wins() {
        let source = KeySource::resolve(Some(Path::new("/etc/github/app.pem")));
        assert!(matches!(source, Ok(KeySource::File(p)) if p == Path::new("/etc/github/app.pem")));
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let result = AppKey::from_pem("Iv1.test", b"not a key");
        assert!(matches!(result, Err(ProxyError::PrivateKey(_))));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let source = KeySource::File(PathBuf::from("/nonexistent/github-proxy/key.pem"));
        assert!(matches!(AppKey::load("Iv1.test", &source), Err(ProxyError::PrivateKey(_))));
    }
}
