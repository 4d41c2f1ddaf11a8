//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Longest user agent kept for audit records
const USER_AGENT_MAX_LEN: usize = 512;

/// What is known about the client that sent a request.
///
/// Recorded alongside audit events; never used for authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// User-Agent header, truncated
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Get IP as string (for storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Build a [`ClientContext`] from request headers and the socket address.
pub fn extract_client_context(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientContext {
    ClientContext::new(
        extract_client_ip(headers, direct_ip),
        extract_user_agent(headers),
    )
}

/// User-Agent header, if present and valid UTF-8.
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    let ua = headers.get(header::USER_AGENT)?.to_str().ok()?.trim();
    if ua.is_empty() {
        return None;
    }
    Some(ua.chars().take(USER_AGENT_MAX_LEN).collect())
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }

    #[test]
    fn test_extract_client_context() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );
        let direct: IpAddr = "10.1.2.3".parse().unwrap();

        let ctx = extract_client_context(&headers, Some(direct));
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(ctx.ip_string().as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn test_extract_user_agent_truncates() {
        let long = "a".repeat(2 * USER_AGENT_MAX_LEN);
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let ua = extract_user_agent(&headers).unwrap();
        assert_eq!(ua.len(), USER_AGENT_MAX_LEN);
    }

    #[test]
    fn test_extract_user_agent_missing() {
        assert_eq!(extract_user_agent(&HeaderMap::new()), None);
    }
}
