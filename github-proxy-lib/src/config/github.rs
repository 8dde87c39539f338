use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::content::INLINE_THRESHOLD;
use crate::github::DEFAULT_API_URL;

/// GitHub App configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    /// Default: "https://api.github.com"
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// GitHub App client ID, used as the JWT issuer
    #[serde(default)]
    pub client_id: String,
    /// Installation the proxy reads repositories through
    #[serde(default)]
    pub installation_id: String,
    /// Path to the App private key (PEM)
    /// When unset, the key is read from the GH_PRIVATE_KEY environment variable
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            client_id: String::new(),
            installation_id: String::new(),
            private_key_path: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Installation token cache configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialConfig {
    /// Seconds subtracted from the reported token expiry
    /// Default: 180
    #[serde(default = "default_safety_margin")]
    pub safety_margin_secs: u64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self { safety_margin_secs: default_safety_margin() }
    }
}

impl CredentialConfig {
    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(self.safety_margin_secs)
    }
}

fn default_safety_margin() -> u64 {
    180
}

/// File retrieval configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Files larger than this are fetched through their download URL
    /// Default: 1048576 (1 MiB)
    #[serde(default = "default_inline_threshold")]
    pub inline_threshold_bytes: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self { inline_threshold_bytes: default_inline_threshold() }
    }
}

fn default_inline_threshold() -> u64 {
    INLINE_THRESHOLD
}
