use serde::Deserialize;
use std::net::SocketAddr;

use super::github::{ContentConfig, CredentialConfig, GitHubConfig};
use super::security::SecurityConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:8080" or "127.0.0.1:8080"
    /// Default: "0.0.0.0:8080"
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// GitHub App identity and API endpoint
    #[serde(default)]
    pub github: GitHubConfig,
    /// Installation token caching
    #[serde(default)]
    pub credential: CredentialConfig,
    /// File retrieval tuning
    #[serde(default)]
    pub content: ContentConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Security configuration (connection limit, rate limiting)
    #[serde(default)]
    pub security: SecurityConfig,
    /// Telemetry configuration
    /// Controls metrics and the observability server
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            github: GitHubConfig::default(),
            credential: CredentialConfig::default(),
            content: ContentConfig::default(),
            logging: LoggingConfig::default(),
            timeout: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
