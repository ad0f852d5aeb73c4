//! Upstream proxy selection for a single request.
//!
//! Sources in priority order: the `X-Proxy-Config` header, the `proxy` query
//! parameter, the tenant's default proxy. A lower source is never parsed when a
//! higher one is present, so a broken default cannot fail a request that brings
//! its own proxy.

use axum::http::HeaderMap;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use percent_encoding::percent_decode_str;
use relaygate_types::models::{ProxyCredentials, ProxyScheme, ProxyTarget};
use serde::Deserialize;
use url::Url;

use super::headers::{header_str, query_param, PROXY_CONFIG_HEADER, PROXY_QUERY_PARAM};
use crate::error::{AppError, AppResult};

/// Standard alphabet; padding optional.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeaderProxyConfig {
    url: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
}

pub fn resolve(
    headers: &HeaderMap,
    query: Option<&str>,
    tenant_default: Option<&str>,
) -> AppResult<Option<ProxyTarget>> {
    if headers.contains_key(PROXY_CONFIG_HEADER) {
        let value = header_str(headers, PROXY_CONFIG_HEADER)
            .ok_or_else(|| AppError::invalid_proxy_config("X-Proxy-Config header is empty"))?;
        return parse_proxy_header(value).map(Some);
    }
    if let Some(raw) = query_param(query, PROXY_QUERY_PARAM) {
        return parse_proxy_url(&raw).map(Some);
    }
    tenant_default.map(str::trim).filter(|d| !d.is_empty()).map(parse_proxy_url).transpose()
}

/// Base64 JSON form carried by `X-Proxy-Config`.
pub fn parse_proxy_header(value: &str) -> AppResult<ProxyTarget> {
    let decoded = LENIENT_STANDARD.decode(value.trim()).map_err(|e| {
        AppError::invalid_proxy_config(format!("X-Proxy-Config is not valid base64: {e}"))
    })?;
    let cfg: HeaderProxyConfig = serde_json::from_slice(&decoded).map_err(|e| {
        AppError::invalid_proxy_config(format!("X-Proxy-Config is not valid JSON: {e}"))
    })?;

    let credentials = cfg
        .username
        .filter(|u| !u.is_empty())
        .map(|username| ProxyCredentials { username, password: cfg.password.unwrap_or_default() });
    build_target(&cfg.url, cfg.kind.as_deref(), credentials, cfg.timeout)
}

/// Bare proxy URL; credentials come from the userinfo. No scheme means `http`.
pub fn parse_proxy_url(raw: &str) -> AppResult<ProxyTarget> {
    build_target(raw, None, None, None)
}

fn build_target(
    raw_url: &str,
    kind: Option<&str>,
    credentials: Option<ProxyCredentials>,
    timeout: Option<u64>,
) -> AppResult<ProxyTarget> {
    let raw = raw_url.trim();
    if raw.is_empty() {
        return Err(AppError::invalid_proxy_config("proxy url cannot be empty"));
    }

    let (url_scheme, rest) = raw.split_once("://").unwrap_or(("http", raw));
    let scheme = match kind.map(str::trim).filter(|k| !k.is_empty()) {
        Some(k) => ProxyScheme::parse(k).ok_or_else(|| {
            AppError::invalid_proxy_config(format!("unsupported proxy type '{k}'"))
        })?,
        None => ProxyScheme::parse(url_scheme).ok_or_else(|| {
            AppError::invalid_proxy_config(format!("unsupported proxy scheme '{url_scheme}'"))
        })?,
    };

    // The stored URL always carries the effective scheme.
    let mut parsed = Url::parse(&format!("{}://{}", scheme.as_str(), rest))
        .map_err(|e| AppError::invalid_proxy_config(format!("malformed proxy url: {e}")))?;
    canonicalize_host(&mut parsed)?;
    let from_userinfo = take_userinfo(&mut parsed);

    let url = parsed.as_str().trim_end_matches('/').to_string();
    Ok(ProxyTarget::new(url, scheme, credentials.or(from_userinfo), timeout))
}

/// `socks5` is not a special scheme to the `url` crate, so its host stays
/// opaque: `127.1`, `2130706433` and `0x7f000001` would reach the resolver as
/// written. Re-parse the host under `http` to get the canonical form.
fn canonicalize_host(url: &mut Url) -> AppResult<()> {
    if url.is_special() {
        return Ok(());
    }
    let Some(host) = url.host_str().filter(|h| !h.is_empty()).map(str::to_string) else {
        return Ok(());
    };
    let canonical = Url::parse(&format!("http://{host}/"))
        .map_err(|e| AppError::invalid_proxy_config(format!("malformed proxy host: {e}")))?;
    if let Some(canonical) = canonical.host_str() {
        if canonical != host {
            url.set_host(Some(canonical)).map_err(|e| {
                AppError::invalid_proxy_config(format!("malformed proxy host: {e}"))
            })?;
        }
    }
    Ok(())
}

fn take_userinfo(url: &mut Url) -> Option<ProxyCredentials> {
    if url.username().is_empty() {
        return None;
    }
    let username = percent_decode_str(url.username()).decode_utf8_lossy().into_owned();
    let password = url
        .password()
        .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned())
        .unwrap_or_default();
    // Only fails for URLs without a host, which cannot carry userinfo.
    let _ = url.set_password(None);
    let _ = url.set_username("");
    Some(ProxyCredentials { username, password })
}
