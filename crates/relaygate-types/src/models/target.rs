//! Upstream proxy target resolved for a single request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    Http,
    Https,
    Socks5,
}

impl ProxyScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks5 => "socks5",
        }
    }

    /// Accepts `socks5h` as an alias of `socks5`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            "socks5" | "socks5h" => Some(Self::Socks5),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Immutable once resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProxyTarget {
    url: String,
    scheme: ProxyScheme,
    credentials: Option<ProxyCredentials>,
    timeout_secs: u64,
}

impl ProxyTarget {
    /// A zero or absent timeout falls back to [`DEFAULT_TIMEOUT_SECS`].
    pub fn new(
        url: impl Into<String>,
        scheme: ProxyScheme,
        credentials: Option<ProxyCredentials>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            url: url.into(),
            scheme,
            credentials,
            timeout_secs: timeout_secs.filter(|t| *t > 0).unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    pub fn credentials(&self) -> Option<&ProxyCredentials> {
        self.credentials.as_ref()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Scheme prefix of the raw URL (before `://`), lowercased.
    pub fn url_scheme(&self) -> Option<String> {
        self.url.split_once("://").map(|(s, _)| s.to_ascii_lowercase())
    }

    /// Host component of the URL, without userinfo, port or IPv6 brackets.
    pub fn host(&self) -> String {
        let rest = self.url.split_once("://").map_or(self.url.as_str(), |(_, r)| r);
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        if let Some(v6) = host_port.strip_prefix('[') {
            return v6.split(']').next().unwrap_or_default().to_ascii_lowercase();
        }
        host_port.split(':').next().unwrap_or_default().to_ascii_lowercase()
    }
}
