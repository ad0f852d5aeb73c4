//! The proxy forward path: tenant, token gate, destination, upstream proxy, send.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use relaygate_types::models::{GatewayConfig, ProxyConfig};
use relaygate_types::ErrorCode;
use url::Url;

use super::client::ClientFactory;
use super::dispatch::proxy_remainder;
use super::headers::{
    header_str, inbound_headers, outbound_headers, query_param, strip_control_params,
    TARGET_URL_HEADER, TARGET_URL_QUERY_PARAM,
};
use super::ssrf::{self, SsrfPolicy};
use super::target;
use crate::auth::token::{extract_access_token, Sha256TokenHasher, TokenHasher};
use crate::error::{AppError, AppResult};
use crate::metrics::MetricsCollector;
use crate::store::ConfigStore;

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub ssrf: SsrfPolicy,
    pub require_access_token: bool,
    pub max_body_bytes: usize,
    /// Timeout of the direct (no upstream proxy) client
    pub default_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

impl GatewayOptions {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            ssrf: SsrfPolicy::from_config(config),
            require_access_token: config.require_access_token,
            max_body_bytes: config.max_body_bytes,
            default_timeout: Duration::from_secs(config.default_timeout_secs.max(1)),
        }
    }
}

pub struct Gateway {
    store: Arc<ConfigStore>,
    metrics: Arc<MetricsCollector>,
    clients: ClientFactory,
    hasher: Arc<dyn TokenHasher>,
    options: GatewayOptions,
}

impl Gateway {
    pub fn new(
        store: Arc<ConfigStore>,
        metrics: Arc<MetricsCollector>,
        options: GatewayOptions,
    ) -> AppResult<Self> {
        Ok(Self {
            store,
            metrics,
            clients: ClientFactory::new(options.default_timeout)?,
            hasher: Arc::new(Sha256TokenHasher),
            options,
        })
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn TokenHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn hasher(&self) -> &dyn TokenHasher {
        self.hasher.as_ref()
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Whether a Host label names a configured tenant.
    pub fn is_tenant(&self, label: &str) -> bool {
        self.store.contains_subdomain(label)
    }

    /// Forward a request classified as proxy traffic; errors become envelopes.
    pub async fn handle(&self, tenant: Option<&str>, request: Request) -> Response {
        match self.forward(tenant, request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn forward(&self, host_tenant: Option<&str>, request: Request) -> AppResult<Response> {
        let _active = self.metrics.track_request();
        let (parts, body) = request.into_parts();
        let query = parts.uri.query();

        let host_config = match host_tenant {
            Some(sub) => Some(
                self.store.get_by_subdomain(sub).ok_or_else(|| AppError::config_not_found(sub))?,
            ),
            None => None,
        };
        if let Some(config) = &host_config {
            ensure_enabled(config)?;
        }

        let tenant = self.token_gate(&parts, host_config)?;
        let destination = self.destination(&parts, tenant.as_ref(), host_tenant.is_some())?;

        let proxy = target::resolve(
            &parts.headers,
            query,
            tenant.as_ref().and_then(|c| c.default_proxy.as_deref()),
        )?;
        let validated = ssrf::validate(proxy.as_ref(), &self.options.ssrf)?;
        let client = self.clients.build(validated.as_ref())?;

        let body = axum::body::to_bytes(body, self.options.max_body_bytes).await.map_err(|e| {
            AppError::new(ErrorCode::InvalidInput, "request body too large or unreadable")
                .with_cause(e)
        })?;
        let request_bytes = body.len() as u64;
        let target_host = destination.host_str().unwrap_or_default().to_string();
        let tenant_id = tenant.as_ref().map(|c| c.id.clone());

        let started = Instant::now();
        let result = client
            .request(parts.method.clone(), destination)
            .headers(outbound_headers(&parts.headers))
            .body(body)
            .send()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(upstream) => {
                let bytes = request_bytes + upstream.content_length().unwrap_or(0);
                self.record(tenant_id.as_deref(), elapsed_ms, bytes, true);
                tracing::debug!(
                    method = %parts.method,
                    host = %target_host,
                    status = upstream.status().as_u16(),
                    elapsed_ms,
                    via_proxy = validated.is_some(),
                    "Forwarded request"
                );
                Ok(into_response(upstream))
            },
            Err(e) => {
                self.record(tenant_id.as_deref(), elapsed_ms, request_bytes, false);
                tracing::warn!(
                    method = %parts.method,
                    host = %target_host,
                    elapsed_ms,
                    "Upstream request failed: {}",
                    e
                );
                Err(AppError::proxy_failed(&target_host, e))
            },
        }
    }

    /// Validate a presented token. For `/proxy` the token selects the tenant;
    /// for a host-matched tenant it must belong to it.
    fn token_gate(
        &self,
        parts: &Parts,
        host_config: Option<ProxyConfig>,
    ) -> AppResult<Option<ProxyConfig>> {
        let Some(raw) = extract_access_token(&parts.headers, parts.uri.query()) else {
            if self.options.require_access_token {
                return Err(AppError::unauthorized("access token required"));
            }
            return Ok(host_config);
        };

        self.metrics.record_token_validation();
        let expected = host_config.as_ref().map(|c| c.id.as_str());
        let token = self.store.authenticate(&self.hasher.hash(&raw), expected)?;

        if host_config.is_some() {
            return Ok(host_config);
        }
        let config = self
            .store
            .get(&token.config_id)
            .ok_or_else(|| AppError::config_not_found(&token.config_id))?;
        ensure_enabled(&config)?;
        Ok(Some(config))
    }

    fn destination(
        &self,
        parts: &Parts,
        tenant: Option<&ProxyConfig>,
        host_matched: bool,
    ) -> AppResult<Url> {
        let query = parts.uri.query();
        let supplied = header_str(&parts.headers, TARGET_URL_HEADER)
            .map(str::to_string)
            .or_else(|| query_param(query, TARGET_URL_QUERY_PARAM));
        if let Some(raw) = supplied {
            return ssrf::validate_destination(&raw, &self.options.ssrf);
        }

        let Some(config) = tenant else {
            return Err(AppError::missing_field("target_url"));
        };
        let path = if host_matched { parts.uri.path() } else { proxy_remainder(parts.uri.path()) };
        let mut raw = format!("{}{}", config.destination_base(), path);
        if let Some(rest) = strip_control_params(query) {
            raw.push('?');
            raw.push_str(&rest);
        }
        Url::parse(&raw).map_err(|e| {
            AppError::new(ErrorCode::InvalidTarget, format!("invalid destination url: {e}"))
                .with_detail("config_id", config.id.as_str())
        })
    }

    fn record(&self, tenant_id: Option<&str>, elapsed_ms: u64, bytes: u64, success: bool) {
        self.metrics.record_request(elapsed_ms, success);
        if let Some(id) = tenant_id {
            self.store.record_access(id, elapsed_ms, bytes, success);
        }
    }
}

fn ensure_enabled(config: &ProxyConfig) -> AppResult<()> {
    if config.enabled {
        return Ok(());
    }
    Err(AppError::new(ErrorCode::ServiceUnavailable, "proxy config is disabled")
        .with_detail("config_id", config.id.as_str()))
}

/// Status and headers as received; the body is streamed through.
fn into_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = inbound_headers(upstream.headers());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
