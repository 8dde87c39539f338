use serde::Deserialize;
use std::time::Duration;

/// Security configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Maximum number of concurrent connections allowed
    /// Default: 512
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Per-client rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { max_connections: default_max_connections(), rate_limit: RateLimitConfig::default() }
    }
}

fn default_max_connections() -> usize {
    512
}

/// Per-client rate limiting configuration
///
/// The global limit is not configured here: it is sized at startup from the
/// installation's API quota.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Requests a single client may burst
    /// Default: 8
    #[serde(default = "default_client_burst")]
    pub client_burst: u32,
    /// Sustained requests per minute for a single client
    /// Default: 60
    #[serde(default = "default_client_requests_per_minute")]
    pub client_requests_per_minute: u32,
    /// Seconds of inactivity after which a client's limiter is dropped
    /// Default: 1800
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
    /// Seconds between sweeps of idle client limiters
    /// Default: 1800
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            client_burst: default_client_burst(),
            client_requests_per_minute: default_client_requests_per_minute(),
            idle_ttl_secs: default_idle_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl RateLimitConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_client_burst() -> u32 {
    8
}

fn default_client_requests_per_minute() -> u32 {
    60
}

fn default_idle_ttl() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    30 * 60
}
