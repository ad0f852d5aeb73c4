//! Request classification. Every request lands in exactly one [`RouteKind`].

use std::sync::LazyLock;

use axum::http::Method;
use regex::Regex;

pub const PROXY_PATH: &str = "/proxy";

#[allow(clippy::expect_used, reason = "constant pattern")]
static TOKEN_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/api/configs/[^/]+/tokens(?:/[^/]+)?/?$").expect("Token path regex is valid")
});

const PUBLIC_PATHS: &[&str] = &["/health", "/healthz", "/version"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// `OPTIONS` on any path
    Preflight,
    /// Forward; `tenant` is the host-matched subdomain, if any
    Proxy { tenant: Option<String> },
    /// Config and metrics APIs
    Admin,
    /// Per-config token API
    Token,
    /// Unauthenticated probes
    Public,
    Static,
}

impl RouteKind {
    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Token)
    }
}

/// First match wins: preflight, proxy, token, admin, public, static.
///
/// `is_tenant` is asked about the first label of a dotted `Host`.
pub fn classify(
    method: &Method,
    path: &str,
    host: Option<&str>,
    is_tenant: impl Fn(&str) -> bool,
) -> RouteKind {
    if method == Method::OPTIONS {
        return RouteKind::Preflight;
    }

    let tenant = host.and_then(tenant_label).filter(|label| is_tenant(label));
    if tenant.is_some() || is_proxy_path(path) {
        return RouteKind::Proxy { tenant };
    }

    if TOKEN_PATH.is_match(path) {
        return RouteKind::Token;
    }
    if is_under(path, "/api") {
        return RouteKind::Admin;
    }
    if PUBLIC_PATHS.contains(&path) {
        return RouteKind::Public;
    }
    RouteKind::Static
}

pub fn is_proxy_path(path: &str) -> bool {
    is_under(path, PROXY_PATH)
}

/// Path after `/proxy`, always starting with `/`.
pub fn proxy_remainder(path: &str) -> &str {
    match path.strip_prefix(PROXY_PATH) {
        Some(rest) if rest.starts_with('/') => rest,
        _ => "/",
    }
}

/// `prefix` itself or anything below it.
fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Lowercased first DNS label of a `Host` value with a dot, port stripped.
pub fn tenant_label(host: &str) -> Option<String> {
    let host = host.trim();
    if host.starts_with('[') {
        return None;
    }
    let name = host.split(':').next().unwrap_or_default();
    if !name.contains('.') {
        return None;
    }
    name.split('.').next().filter(|l| !l.is_empty()).map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(method: Method, path: &str, host: Option<&str>) -> RouteKind {
        classify(&method, path, host, |label| label == "shop")
    }

    #[test]
    fn test_preflight_wins() {
        assert_eq!(kind(Method::OPTIONS, "/api/configs", None), RouteKind::Preflight);
        assert_eq!(kind(Method::OPTIONS, "/x", Some("shop.gw.io")), RouteKind::Preflight);
    }

    #[test]
    fn test_proxy_routes() {
        assert_eq!(kind(Method::GET, "/proxy", None), RouteKind::Proxy { tenant: None });
        assert_eq!(kind(Method::POST, "/proxy/a/b", None), RouteKind::Proxy { tenant: None });
        assert_eq!(
            kind(Method::GET, "/api/configs", Some("Shop.gw.io:8080")),
            RouteKind::Proxy { tenant: Some("shop".into()) }
        );
        assert_eq!(kind(Method::GET, "/proxyish", None), RouteKind::Static);
        assert_eq!(kind(Method::GET, "/", Some("blog.gw.io")), RouteKind::Static);
    }

    #[test]
    fn test_api_routes() {
        assert_eq!(kind(Method::GET, "/api/configs", None), RouteKind::Admin);
        assert_eq!(kind(Method::POST, "/api/configs/batch", None), RouteKind::Admin);
        assert_eq!(kind(Method::GET, "/api/configs/abc", None), RouteKind::Admin);
        assert_eq!(kind(Method::GET, "/api/configs/abc/tokens", None), RouteKind::Token);
        assert_eq!(kind(Method::DELETE, "/api/configs/abc/tokens/t1", None), RouteKind::Token);
        assert_eq!(kind(Method::PUT, "/api/configs/abc/tokens/t1/", None), RouteKind::Token);
        assert_eq!(kind(Method::GET, "/api/configs/abc/tokens/t1/x", None), RouteKind::Admin);
        assert_eq!(kind(Method::GET, "/api/configs//tokens", None), RouteKind::Admin);
        assert_eq!(kind(Method::GET, "/api/metrics/health", None), RouteKind::Admin);
        assert_eq!(kind(Method::GET, "/api/unknown", None), RouteKind::Admin);
        assert!(RouteKind::Token.requires_admin());
    }

    #[test]
    fn test_public_and_static() {
        assert_eq!(kind(Method::GET, "/health", None), RouteKind::Public);
        assert_eq!(kind(Method::GET, "/version", None), RouteKind::Public);
        assert_eq!(kind(Method::GET, "/index.html", None), RouteKind::Static);
        assert!(!RouteKind::Static.requires_admin());
    }

    #[test]
    fn test_tenant_label() {
        assert_eq!(tenant_label("shop.example.com").as_deref(), Some("shop"));
        assert_eq!(tenant_label("SHOP.example.com:443").as_deref(), Some("shop"));
        assert_eq!(tenant_label("localhost:8080"), None);
        assert_eq!(tenant_label("[::1]:8080"), None);
        assert_eq!(tenant_label(".example.com"), None);
    }

    #[test]
    fn test_proxy_remainder() {
        assert_eq!(proxy_remainder("/proxy"), "/");
        assert_eq!(proxy_remainder("/proxy/v1/items"), "/v1/items");
    }
}
