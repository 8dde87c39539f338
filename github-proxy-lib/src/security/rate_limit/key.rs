use http::HeaderMap;
use std::net::SocketAddr;

pub const REAL_IP_HEADER: &str = "x-real-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Derive the rate limiting key for a request.
///
/// Precedence: `X-Real-IP`, then the first element of `X-Forwarded-For`, then
/// the peer IP without its port. Both headers are taken on trust, so behind an
/// intermediary that does not overwrite them the key can be spoofed.
pub fn extract_client_key(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(ip) = header_str(headers, REAL_IP_HEADER) {
        return ip.to_string();
    }

    if let Some(xff) = header_str(headers, FORWARDED_FOR_HEADER) {
        if let Some(first) = xff.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    peer.ip().to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
