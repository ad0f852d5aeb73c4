//! Gateway settings file.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use validator::Validate;

/// Settings loaded from the JSON config file and overridden by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Configuration struct - bools are intentional feature flags"
)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[validate(range(min = 1_u16))]
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared administrative secret (`X-Admin-Key`)
    #[serde(default)]
    pub admin_key: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[validate(range(min = 1_usize))]
    #[serde(default = "default_max_configs")]
    pub max_configs: usize,
    #[validate(range(min = 1_usize))]
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_config: usize,
    /// Permit upstream proxies and destinations on private networks
    #[serde(default)]
    pub allow_private_ip: bool,
    /// Substrings; when non-empty a proxy host must contain one of them
    #[serde(default)]
    pub proxy_whitelist: Vec<String>,
    /// Every forward must present a valid access token
    #[serde(default)]
    pub require_access_token: bool,
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_timeout")]
    pub default_timeout_secs: u64,
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_tick")]
    pub metrics_tick_secs: u64,
    /// Snapshot file for tenant configs; in-memory only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Reverse proxies whose `X-Forwarded-For`/`X-Real-IP` are believed
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
    #[validate(range(min = 1024_usize))]
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_max_configs() -> usize {
    1000
}

fn default_max_tokens() -> usize {
    50
}

fn default_timeout() -> u64 {
    30
}

fn default_tick() -> u64 {
    30
}

fn default_max_body() -> usize {
    100 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_key: String::new(),
            static_dir: default_static_dir(),
            max_configs: default_max_configs(),
            max_tokens_per_config: default_max_tokens(),
            allow_private_ip: false,
            proxy_whitelist: Vec::new(),
            require_access_token: false,
            default_timeout_secs: default_timeout(),
            metrics_tick_secs: default_tick(),
            data_file: None,
            log_dir: None,
            trusted_proxies: Vec::new(),
            max_body_bytes: default_max_body(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let cfg: GatewayConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.max_configs, 1000);
        assert_eq!(cfg.max_tokens_per_config, 50);
        assert!(!cfg.allow_private_ip);
        assert!(cfg.trusted_proxies.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_trusted_proxies_parse() {
        let cfg: GatewayConfig =
            serde_json::from_str(r#"{"trusted_proxies": ["10.0.0.2", "::1"]}"#).unwrap();
        assert_eq!(cfg.trusted_proxies.len(), 2);
        assert!(serde_json::from_str::<GatewayConfig>(r#"{"trusted_proxies": ["lb"]}"#).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let cfg = GatewayConfig { max_configs: 0, metrics_tick_secs: 0, ..Default::default() };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_configs"));
        assert!(errors.field_errors().contains_key("metrics_tick_secs"));
    }
}
