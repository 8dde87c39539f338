use http::HeaderMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

use crate::proxy::http_result::{HttpError, HttpResult};
use crate::security::{extract_client_key, RateGate};
use crate::telemetry::Metrics;

/// Run the request through both admission tiers.
///
/// Returns:
/// - `Ok(())` if the request may proceed
/// - `Err(HttpError::RateLimited)` naming the tier that rejected it
pub fn check_admission(
    gate: &RateGate,
    headers: &HeaderMap,
    peer: SocketAddr,
    metrics: Option<&Arc<Metrics>>,
) -> HttpResult<()> {
    let client = extract_client_key(headers, peer);
    let result = gate.allow(&client);

    if result.is_admitted() {
        if let Some(m) = metrics {
            m.record_rate_limit_allowed();
        }
        return Ok(());
    }

    debug!(client = %client, scope = result.scope(), "admission denied");
    if let Some(m) = metrics {
        m.record_rate_limit_rejection(result.scope());
    }
    Err(HttpError::RateLimited(result))
}
