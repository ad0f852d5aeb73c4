use axum::http::HeaderMap;
use relaygate_types::ErrorCode;
use std::net::IpAddr;
use subtle::ConstantTimeEq;

use super::rate_limiter::AuthFailureTracker;
use crate::error::{AppError, AppResult};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Checks the shared administrative secret for admin and token APIs.
pub struct AdminGuard {
    admin_key: String,
    failures: AuthFailureTracker,
    trusted_proxies: Vec<IpAddr>,
}

impl AdminGuard {
    pub fn new(admin_key: impl Into<String>) -> Self {
        Self::with_tracker(admin_key, AuthFailureTracker::default())
    }

    pub fn with_tracker(admin_key: impl Into<String>, failures: AuthFailureTracker) -> Self {
        Self { admin_key: admin_key.into(), failures, trusted_proxies: Vec::new() }
    }

    pub fn with_trusted_proxies(mut self, trusted_proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = trusted_proxies;
        self
    }

    /// Address the failure tracker is keyed on; see [`client_ip`].
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
        client_ip(headers, peer, &self.trusted_proxies)
    }

    pub fn authorize(&self, headers: &HeaderMap, client_ip: Option<IpAddr>) -> AppResult<()> {
        if let Some(ip) = client_ip {
            if self.failures.is_blocked(ip) {
                tracing::warn!("Blocked IP {} attempted admin access", ip);
                return Err(AppError::new(
                    ErrorCode::RateLimitExceeded,
                    "too many failed authentication attempts",
                ));
            }
        }

        if self.admin_key.is_empty() {
            tracing::error!("Admin auth is required but admin_key is empty");
            return Err(AppError::unauthorized("admin access is not configured"));
        }

        let presented = headers.get(ADMIN_KEY_HEADER).and_then(|h| h.to_str().ok());
        match presented {
            Some(key) if constant_time_compare(key, &self.admin_key) => {
                if let Some(ip) = client_ip {
                    self.failures.clear(ip);
                }
                Ok(())
            },
            other => {
                if let Some(ip) = client_ip {
                    self.failures.record_failure(ip);
                }
                let message =
                    if other.is_some() { "invalid admin key" } else { "missing admin key" };
                Err(AppError::unauthorized(message))
            },
        }
    }
}

/// Client address for rate limiting. The TCP peer, unless the peer is a
/// trusted reverse proxy: then the nearest untrusted `X-Forwarded-For` hop,
/// falling back to `X-Real-IP`.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<IpAddr> {
    let peer = peer?;
    if !trusted_proxies.contains(&peer) {
        return Some(peer);
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|chain| {
            chain
                .rsplit(',')
                .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
                .find(|hop| !trusted_proxies.contains(hop))
        });
    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        })
        .or(Some(peer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(key) {
            h.insert(ADMIN_KEY_HEADER, v);
        }
        h
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("ab", "abc"));
    }

    #[test]
    fn test_authorize() {
        let guard = AdminGuard::new("s3cret");
        assert!(guard.authorize(&headers_with_key("s3cret"), None).is_ok());

        let err = guard.authorize(&headers_with_key("nope"), None).err();
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::Unauthorized));

        let err = guard.authorize(&HeaderMap::new(), None).err();
        assert_eq!(err.map(|e| e.message().to_string()), Some("missing admin key".to_string()));
    }

    #[test]
    fn test_empty_configured_key_denies() {
        let guard = AdminGuard::new("");
        assert!(guard.authorize(&headers_with_key(""), None).is_err());
    }

    #[test]
    fn test_repeated_failures_block_ip() {
        let guard = AdminGuard::with_tracker("s3cret", AuthFailureTracker::new(2, std::time::Duration::from_secs(60)));
        let ip = Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)));
        let _ = guard.authorize(&headers_with_key("bad"), ip);
        let _ = guard.authorize(&headers_with_key("bad"), ip);
        let err = guard.authorize(&headers_with_key("s3cret"), ip).err();
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::RateLimitExceeded));
    }

    #[test]
    fn test_client_ip_ignores_headers_from_untrusted_peer() {
        let peer = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));
        h.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&h, peer, &[]), peer);
        assert_eq!(client_ip(&h, None, &[]), None);
    }

    #[test]
    fn test_client_ip_behind_trusted_proxy() {
        let lb = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let trusted = [lb];
        let mut h = HeaderMap::new();
        assert_eq!(client_ip(&h, Some(lb), &trusted), Some(lb));

        h.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&h, Some(lb), &trusted), "198.51.100.4".parse().ok());

        // leftmost hops are client-controlled; take the nearest untrusted one
        h.insert("x-forwarded-for", HeaderValue::from_static("1.1.1.1, 203.0.113.1, 10.0.0.2"));
        assert_eq!(client_ip(&h, Some(lb), &trusted), "203.0.113.1".parse().ok());
    }

    #[test]
    fn test_spoofed_forwarding_cannot_lock_out_another_client() {
        let guard = AdminGuard::with_tracker(
            "s3cret",
            AuthFailureTracker::new(2, std::time::Duration::from_secs(60)),
        );
        let attacker = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 66)));
        let admin = Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7)));
        let mut spoofed = headers_with_key("bad");
        spoofed.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.7"));

        for _ in 0..3 {
            let _ = guard.authorize(&spoofed, guard.client_ip(&spoofed, attacker));
        }
        let ok = headers_with_key("s3cret");
        assert!(guard.authorize(&ok, guard.client_ip(&ok, admin)).is_ok());
        let err = guard.authorize(&ok, guard.client_ip(&ok, attacker)).err();
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::RateLimitExceeded));
    }
}
