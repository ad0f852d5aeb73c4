//! Outbound HTTP clients, one per distinct upstream proxy.

use std::time::Duration;

use dashmap::DashMap;
use relaygate_types::models::{ProxyScheme, ProxyTarget};
use reqwest::{Client, Proxy};
use url::Url;

use super::ssrf::ValidatedTarget;
use crate::error::{AppError, AppResult};

const MAX_CACHED_CLIENTS: usize = 256;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn redact_proxy_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| format!("{}://{}:{}", u.scheme(), u.host_str().unwrap_or("?"), u.port().unwrap_or(0)))
        .unwrap_or_else(|_| "<invalid-url>".to_string())
}

/// Shared builder: redirects are passed back to the caller, not followed.
fn base_builder(timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .tcp_nodelay(true)
        .redirect(reqwest::redirect::Policy::none())
}

pub struct ClientFactory {
    direct: Client,
    cache: DashMap<ProxyTarget, Client>,
}

impl ClientFactory {
    pub fn new(direct_timeout: Duration) -> AppResult<Self> {
        let direct = base_builder(direct_timeout)
            .build()
            .map_err(|e| AppError::internal("failed to build HTTP client").with_cause(e))?;
        Ok(Self { direct, cache: DashMap::new() })
    }

    /// Direct client for `None`; otherwise a client routed through the target.
    /// Never falls back to a direct connection when a proxy was requested.
    pub fn build(&self, target: Option<&ValidatedTarget>) -> AppResult<Client> {
        let Some(validated) = target else {
            return Ok(self.direct.clone());
        };
        let target = validated.target();

        if let Some(client) = self.cache.get(target) {
            return Ok(client.clone());
        }

        let client = build_proxied_client(target)?;
        if self.cache.len() >= MAX_CACHED_CLIENTS {
            self.cache.clear();
        }
        self.cache.insert(target.clone(), client.clone());
        tracing::debug!(
            proxy = %redact_proxy_url(target.url()),
            scheme = %target.scheme(),
            "Built upstream proxy client"
        );
        Ok(client)
    }

    pub fn cached_clients(&self) -> usize {
        self.cache.len()
    }
}

fn build_proxied_client(target: &ProxyTarget) -> AppResult<Client> {
    let proxy = match target.scheme() {
        ProxyScheme::Socks5 => {
            // socks5h: the proxy resolves the destination name
            let mut url = Url::parse(target.url())
                .map_err(|e| AppError::invalid_proxy_config(format!("invalid proxy url: {e}")))?;
            url.set_scheme("socks5h")
                .map_err(|()| AppError::invalid_proxy_config("proxy url is not a socks5 url"))?;
            if let Some(creds) = target.credentials() {
                url.set_username(&creds.username)
                    .and_then(|()| url.set_password(Some(&creds.password)))
                    .map_err(|()| {
                        AppError::invalid_proxy_config("proxy credentials cannot be applied")
                    })?;
            }
            Proxy::all(url.as_str())
        },
        ProxyScheme::Http | ProxyScheme::Https => Proxy::all(target.url()).map(|p| {
            match target.credentials() {
                Some(creds) => p.basic_auth(&creds.username, &creds.password),
                None => p,
            }
        }),
    }
    .map_err(|e| AppError::invalid_proxy_config(format!("invalid proxy url: {e}")).with_cause(e))?;

    base_builder(target.timeout()).proxy(proxy).build().map_err(|e| {
        AppError::invalid_proxy_config(format!("failed to build proxy client: {e}")).with_cause(e)
    })
}
