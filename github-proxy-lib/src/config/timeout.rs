use serde::Deserialize;
use std::time::Duration;

/// Timeout configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// Timeout for every request to the GitHub API, in milliseconds
    /// Covers token minting, the quota query and file retrieval
    /// Default: 10000 (10 seconds)
    #[serde(default = "default_upstream_timeout")]
    pub upstream_ms: u64,
    /// Graceful shutdown timeout in seconds
    /// In-flight connections get this long to finish before the process exits
    /// Default: 5
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { upstream_ms: default_upstream_timeout(), shutdown_secs: default_shutdown_timeout() }
    }
}

impl TimeoutConfig {
    pub fn upstream(&self) -> Duration {
        Duration::from_millis(self.upstream_ms)
    }

    pub fn shutdown(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }
}

fn default_upstream_timeout() -> u64 {
    10_000
}

fn default_shutdown_timeout() -> u64 {
    5
}
