//! Keeps callers from steering the gateway at internal hosts.

use std::net::IpAddr;

use relaygate_types::models::{GatewayConfig, ProxyScheme, ProxyTarget};
use relaygate_types::ErrorCode;
use url::Url;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct SsrfPolicy {
    /// Host substrings; empty means any public host
    pub whitelist: Vec<String>,
    pub allow_private_ip: bool,
}

impl SsrfPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            whitelist: config
                .proxy_whitelist
                .iter()
                .map(|w| w.trim().to_ascii_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            allow_private_ip: config.allow_private_ip,
        }
    }
}

/// A target that passed [`validate`]; the only input the client factory accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTarget(ProxyTarget);

impl ValidatedTarget {
    pub fn target(&self) -> &ProxyTarget {
        &self.0
    }
}

pub fn validate(
    target: Option<&ProxyTarget>,
    policy: &SsrfPolicy,
) -> AppResult<Option<ValidatedTarget>> {
    let Some(target) = target else {
        return Ok(None);
    };

    let scheme = target.url_scheme().unwrap_or_default();
    if ProxyScheme::parse(&scheme).is_none() {
        return Err(AppError::invalid_proxy_config("unsupported proxy scheme")
            .with_detail("scheme", scheme));
    }

    let host = target.host();
    if host.is_empty() {
        return Err(AppError::invalid_proxy_config("proxy host cannot be empty"));
    }

    if !policy.allow_private_ip && is_private_host(&host) {
        tracing::warn!("Rejected proxy pointing at private host {}", host);
        return Err(AppError::new(
            ErrorCode::SsrfBlocked,
            "proxy host points to a private or reserved address",
        )
        .with_detail("host", host));
    }

    if !policy.whitelist.is_empty() && !policy.whitelist.iter().any(|w| host.contains(w.as_str())) {
        return Err(AppError::invalid_proxy_config("proxy host not in whitelist")
            .with_detail("host", host));
    }

    Ok(Some(ValidatedTarget(target.clone())))
}

/// Check a caller-supplied destination (`X-Target-Url` / `url`).
pub fn validate_destination(raw: &str, policy: &SsrfPolicy) -> AppResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        AppError::new(ErrorCode::InvalidTarget, format!("invalid target url: {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::new(ErrorCode::InvalidTarget, "target url must use http or https")
            .with_detail("scheme", url.scheme()));
    }
    let host = url.host_str().unwrap_or_default();
    if host.is_empty() {
        return Err(AppError::new(ErrorCode::InvalidTarget, "target url must include a host"));
    }
    if !policy.allow_private_ip && is_private_host(host) {
        tracing::warn!("Rejected destination pointing at private host {}", host);
        return Err(AppError::new(
            ErrorCode::SsrfBlocked,
            "target host points to a private or reserved address",
        )
        .with_detail("host", host));
    }
    Ok(url)
}

/// Literal loopback/private/link-local addresses and `localhost` names.
/// Hostnames are not resolved. Numeric spellings that are not dotted-quad
/// (`127.1`, `2130706433`, `0x7f000001`) count as private: resolvers read
/// them as IPv4 and there is no reason to proxy through one.
pub fn is_private_host(host: &str) -> bool {
    let host = host.trim();
    let bare = host.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(host);
    let lower = bare.trim_end_matches('.').to_ascii_lowercase();

    if lower == "localhost" || lower.ends_with(".localhost") {
        return true;
    }
    match lower.parse::<IpAddr>() {
        Ok(ip) => is_private_ip(ip),
        Err(_) => is_numeric_ipv4_form(&lower),
    }
}

/// Dot-separated parts that are all decimal, octal or `0x` hex numbers.
fn is_numeric_ipv4_form(host: &str) -> bool {
    host.split('.').all(|part| match part.strip_prefix("0x") {
        Some(hex) => hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()),
    })
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || (a == 100 && (64..=127).contains(&b)) // 100.64.0.0/10 shared address space
                || (a == 198 && (b == 18 || b == 19)) // 198.18.0.0/15 benchmarking
        },
        IpAddr::V6(v6) => {
            if let Some(mapped_v4) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(mapped_v4));
            }
            let seg0 = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (seg0 & 0xFE00) == 0xFC00  // fc00::/7 unique local
                || (seg0 & 0xFFC0) == 0xFE80 // fe80::/10 link-local
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn target(url: &str) -> ProxyTarget {
        ProxyTarget::new(url, ProxyScheme::Http, None, None)
    }

    fn code(url: &str, policy: &SsrfPolicy) -> Option<ErrorCode> {
        validate(Some(&target(url)), policy).err().map(|e| e.code())
    }

    #[test]
    fn test_absent_target_passes() {
        assert!(validate(None, &SsrfPolicy::default()).unwrap().is_none());
    }

    #[test]
    fn test_private_hosts_blocked_unless_allowed() {
        let strict = SsrfPolicy::default();
        for url in [
            "http://127.0.0.1:8080",
            "http://192.168.1.10:3128",
            "http://10.1.2.3:1",
            "http://172.20.0.1:1",
            "http://169.254.169.254",
            "http://[::1]:1080",
            "http://localhost:8080",
            "http://api.localhost:1",
            "http://0.0.0.0:1",
            "http://[::ffff:127.0.0.1]:1",
            "http://[fd00::1]:1",
            "http://[fe80::1]:1",
        ] {
            assert_eq!(code(url, &strict), Some(ErrorCode::SsrfBlocked), "{url}");
        }

        let relaxed = SsrfPolicy { allow_private_ip: true, ..Default::default() };
        assert_eq!(code("http://127.0.0.1:8080", &relaxed), None);
        assert_eq!(code("http://192.168.1.10:3128", &relaxed), None);
    }

    #[test]
    fn test_numeric_ipv4_forms_blocked() {
        let strict = SsrfPolicy::default();
        for raw in [
            "socks5://127.1:1080",
            "socks5://2130706433:1080",
            "socks5://0x7f000001:1080",
            "socks5://0:1080",
            "http://127.1:3128",
        ] {
            let t = crate::proxy::target::parse_proxy_url(raw).unwrap();
            let err = validate(Some(&t), &strict).unwrap_err();
            assert_eq!(err.code(), ErrorCode::SsrfBlocked, "{raw}");
        }

        // raw forms, as a target built without canonicalization would carry them
        for host in ["127.1", "2130706433", "0x7f000001", "0", "0x7f.0.0.1", "017700000001"] {
            assert!(is_private_host(host), "{host}");
        }
        for host in ["1e100.net", "0xdeadbeef.example", "8.8.8.8", "proxy-1.example.com"] {
            assert!(!is_private_host(host), "{host}");
        }
    }

    #[test]
    fn test_public_host_and_whitelist() {
        assert_eq!(code("http://proxy.example.com:8080", &SsrfPolicy::default()), None);
        assert_eq!(code("http://172.32.0.1:8080", &SsrfPolicy::default()), None);

        let listed = SsrfPolicy { whitelist: vec!["example.com".into()], allow_private_ip: false };
        assert_eq!(code("http://proxy.example.com:8080", &listed), None);
        assert_eq!(code("http://proxy.other.net:8080", &listed), Some(ErrorCode::InvalidProxyConfig));
    }

    #[test]
    fn test_scheme_and_empty_host() {
        let policy = SsrfPolicy::default();
        assert_eq!(code("ftp://proxy.example.com", &policy), Some(ErrorCode::InvalidProxyConfig));
        assert_eq!(code("http://:8080", &policy), Some(ErrorCode::InvalidProxyConfig));
        let err = validate(Some(&target("http://:8080")), &policy).unwrap_err();
        assert_eq!(err.message(), "proxy host cannot be empty");
    }

    #[test]
    fn test_destination_rules() {
        let policy = SsrfPolicy::default();
        assert!(validate_destination("https://api.example.com/v1?x=1", &policy).is_ok());
        assert_eq!(
            validate_destination("file:///etc/passwd", &policy).unwrap_err().code(),
            ErrorCode::InvalidTarget
        );
        assert_eq!(
            validate_destination("http://127.0.0.1:9000/admin", &policy).unwrap_err().code(),
            ErrorCode::SsrfBlocked
        );
        let relaxed = SsrfPolicy { allow_private_ip: true, ..Default::default() };
        assert!(validate_destination("http://127.0.0.1:9000/admin", &relaxed).is_ok());
    }

    #[test]
    fn test_policy_from_config() {
        let config = GatewayConfig {
            proxy_whitelist: vec!["  Corp.Example ".into(), String::new()],
            ..Default::default()
        };
        let policy = SsrfPolicy::from_config(&config);
        assert_eq!(policy.whitelist, vec!["corp.example".to_string()]);
        assert!(!policy.allow_private_ip);
    }
}
