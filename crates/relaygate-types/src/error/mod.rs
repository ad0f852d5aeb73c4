//! Typed error definitions for RelayGate.
//!
//! [`ErrorCode`] is the closed set of machine-readable codes every failure maps
//! to; [`ErrorResponse`] is the JSON envelope clients receive.

mod code;
mod config;

pub use code::{ErrorCategory, ErrorCode};
pub use config::ConfigError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error envelope returned on every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub error_code: ErrorCode,
    /// Structured context (field names, resource ids, hosts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        details: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            error: message.into(),
            error_code: code,
            details: if details.is_empty() { None } else { Some(details) },
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_details() {
        let resp = ErrorResponse::new(ErrorCode::Unauthorized, "missing admin key", BTreeMap::new());
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "missing admin key");
        assert_eq!(json["error_code"], "UNAUTHORIZED");
        assert!(json.get("details").is_none());
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_envelope_keeps_details() {
        let mut details = BTreeMap::new();
        details.insert("target_host".to_string(), serde_json::json!("example.com"));
        let resp = ErrorResponse::new(ErrorCode::ProxyFailed, "upstream unreachable", details);

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"PROXY_FAILED\""));
        assert!(json.contains("example.com"));

        let back: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.error_code, ErrorCode::ProxyFailed);
    }
}
