//! Tenant forwarding rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

pub const MAX_CONFIG_NAME_LENGTH: u64 = 100;
const MAX_SUBDOMAIN_LENGTH: usize = 63;

/// Labels that would shadow gateway-owned hostnames.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "proxy", "static"];

/// Scheme used to reach the tenant's target when `target_url` carries none.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetProtocol {
    #[default]
    Http,
    Https,
}

impl TargetProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Per-tenant traffic statistics, accrued after every completed forward.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigStats {
    pub request_count: u64,
    pub error_count: u64,
    /// Running average over all recorded requests
    pub avg_response_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    pub total_bytes: u64,
}

impl ConfigStats {
    pub fn record(&mut self, elapsed_ms: u64, bytes: u64, success: bool, now: DateTime<Utc>) {
        self.request_count = self.request_count.saturating_add(1);
        if !success {
            self.error_count = self.error_count.saturating_add(1);
        }
        let n = self.request_count as f64;
        self.avg_response_time_ms += (elapsed_ms as f64 - self.avg_response_time_ms) / n;
        self.total_bytes = self.total_bytes.saturating_add(bytes);
        self.last_accessed = Some(now);
    }
}

/// A named forwarding rule binding a subdomain to a target URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ProxyConfig {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1_u64, max = MAX_CONFIG_NAME_LENGTH))]
    pub name: String,
    #[validate(custom(function = "validate_subdomain"))]
    pub subdomain: String,
    #[validate(custom(function = "validate_target_url"))]
    pub target_url: String,
    #[serde(default)]
    pub protocol: TargetProtocol,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Upstream proxy used when a request names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ConfigStats>,
}

fn default_enabled() -> bool {
    true
}

impl ProxyConfig {
    /// Target URL with the protocol applied and no trailing slash.
    pub fn destination_base(&self) -> String {
        let raw = self.target_url.trim();
        let full = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("{}://{}", self.protocol.as_str(), raw)
        };
        full.trim_end_matches('/').to_string()
    }

    pub fn stats_mut(&mut self) -> &mut ConfigStats {
        self.stats.get_or_insert_with(ConfigStats::default)
    }
}

/// Body of `POST /api/configs`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConfigRequest {
    #[validate(length(min = 1_u64, max = MAX_CONFIG_NAME_LENGTH))]
    pub name: String,
    #[validate(custom(function = "validate_subdomain"))]
    pub subdomain: String,
    #[validate(custom(function = "validate_target_url"))]
    pub target_url: String,
    #[serde(default)]
    pub protocol: TargetProtocol,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub default_proxy: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /api/configs/{id}`; absent fields keep their current value.
/// An empty `default_proxy` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    pub name: Option<String>,
    pub subdomain: Option<String>,
    pub target_url: Option<String>,
    pub protocol: Option<TargetProtocol>,
    pub enabled: Option<bool>,
    pub default_proxy: Option<String>,
    pub description: Option<String>,
}

/// Subdomains compare case-insensitively; the stored form is lowercase.
pub fn normalize_subdomain(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

pub fn validate_subdomain(value: &str) -> Result<(), ValidationError> {
    let sub = normalize_subdomain(value);
    if sub.is_empty() || sub.len() > MAX_SUBDOMAIN_LENGTH {
        return Err(violation("subdomain_length", "subdomain must be 1-63 characters"));
    }
    if !sub.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
        return Err(violation(
            "subdomain_format",
            "subdomain may only contain letters, digits and hyphens",
        ));
    }
    if sub.starts_with('-') || sub.ends_with('-') {
        return Err(violation("subdomain_format", "subdomain cannot start or end with a hyphen"));
    }
    if RESERVED_SUBDOMAINS.contains(&sub.as_str()) {
        return Err(violation("subdomain_reserved", "subdomain is reserved"));
    }
    Ok(())
}

pub fn validate_target_url(value: &str) -> Result<(), ValidationError> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err(violation("target_url_required", "target URL is required"));
    }
    let rest = match raw.split_once("://") {
        Some(("http" | "https", rest)) => rest,
        Some(_) => {
            return Err(violation("target_url_scheme", "target URL must use http or https"));
        },
        None => raw,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(violation("target_url_host", "target URL must include a valid host"));
    }
    Ok(())
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}
