//! Gateway control headers and query parameters, and what never crosses the proxy.

use axum::http::{HeaderMap, HeaderName};

use crate::auth::{ACCESS_TOKEN_HEADER, ACCESS_TOKEN_QUERY_PARAM, ADMIN_KEY_HEADER};

pub const PROXY_CONFIG_HEADER: &str = "x-proxy-config";
pub const TARGET_URL_HEADER: &str = "x-target-url";

pub const PROXY_QUERY_PARAM: &str = "proxy";
pub const TARGET_URL_QUERY_PARAM: &str = "url";

/// Consumed by the gateway, never forwarded.
pub const CONTROL_QUERY_PARAMS: &[&str] =
    &[PROXY_QUERY_PARAM, ACCESS_TOKEN_QUERY_PARAM, TARGET_URL_QUERY_PARAM];

const CONTROL_HEADERS: &[&str] =
    &[PROXY_CONFIG_HEADER, TARGET_URL_HEADER, ACCESS_TOKEN_HEADER, ADMIN_KEY_HEADER];

/// RFC 7230 hop-by-hop headers plus the non-standard `proxy-connection`.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

fn is_control(name: &HeaderName) -> bool {
    CONTROL_HEADERS.contains(&name.as_str())
}

/// Headers to send upstream. `host` and `content-length` are set by the client.
pub fn outbound_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if is_hop_by_hop(name)
            || is_control(name)
            || name == axum::http::header::HOST
            || name == axum::http::header::CONTENT_LENGTH
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Headers to return to the caller.
pub fn inbound_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty())
}

/// First non-empty value of `name` in a raw query string.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The query with every control parameter removed, re-encoded; `None` if nothing is left.
pub fn strip_control_params(query: Option<&str>) -> Option<String> {
    let query = query?;
    let kept: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| !CONTROL_QUERY_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        return None;
    }
    Some(url::form_urlencoded::Serializer::new(String::new()).extend_pairs(kept).finish())
}
