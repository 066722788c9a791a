//! Client IP extraction for auth failure limiting
//!
//! Behind a load balancer the socket address is the proxy's, so the client address is
//! taken from `X-Forwarded-For`, skipping the configured number of trusted proxies.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

pub const UNKNOWN_IP: &str = "unknown";

/// Client IP of the request, or `"unknown"` when no source yields a valid address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| from_forwarded_for(v, trusted_proxy_count))
    {
        return ip;
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_valid_ip(v))
    {
        return ip.to_string();
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// `X-Forwarded-For` is `client, proxy1, proxy2, ...`. With N trusted proxies the client
/// is the entry just before the last N. With zero, or a chain shorter than expected, only
/// the last hop is used.
fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let candidate = if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        ips.last()?
    } else {
        ips.get(ips.len() - trusted_proxy_count - 1)?
    };

    is_valid_ip(candidate).then(|| candidate.to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}
