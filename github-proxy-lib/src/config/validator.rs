use super::Config;
use crate::error::{ProxyError, Result};

pub fn validate(config: &Config) -> Result<()> {
    let fail = |msg: &str| Err(ProxyError::Config(msg.to_string()));

    if config.github.client_id.trim().is_empty() {
        return fail("client ID is required");
    }
    if config.github.installation_id.trim().is_empty() {
        return fail("installation ID is required");
    }
    let api_url = config.github.api_url.as_str();
    if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
        return fail("github.api_url must be an http(s) URL");
    }
    if config.security.max_connections == 0 {
        return fail("max_connections must be > 0");
    }
    let rate_limit = &config.security.rate_limit;
    if rate_limit.client_burst == 0 {
        return fail("client_burst must be > 0");
    }
    if rate_limit.client_requests_per_minute == 0 {
        return fail("client_requests_per_minute must be > 0");
    }
    if rate_limit.sweep_interval_secs == 0 {
        return fail("sweep_interval_secs must be > 0");
    }
    if config.timeout.upstream_ms == 0 {
        return fail("upstream_ms must be > 0");
    }
    Ok(())
}
