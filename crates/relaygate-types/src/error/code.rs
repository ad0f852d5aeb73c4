//! Closed error-code taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping used for logging and for deciding whether a failure is the caller's fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Resource,
    Validation,
    System,
    Business,
}

/// Stable machine-readable error code, serialized as `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication
    Unauthorized,
    TokenExpired,
    TokenDisabled,
    InvalidToken,
    PermissionDenied,

    // Resource
    NotFound,
    ConfigNotFound,
    TokenNotFound,
    DuplicateResource,
    DuplicateSubdomain,

    // Validation
    ValidationFailed,
    InvalidInput,
    MissingField,
    InvalidFormat,

    // System
    InternalError,
    ServiceUnavailable,
    RateLimitExceeded,
    ResourceExhausted,

    // Business
    MaxTokensExceeded,
    MaxEntriesExceeded,
    InvalidTarget,
    ProxyFailed,
    SsrfBlocked,
    InvalidProxyConfig,
}

impl ErrorCode {
    /// HTTP status code for this error.
    pub fn http_status_code(self) -> u16 {
        match self {
            Self::Unauthorized | Self::TokenExpired | Self::InvalidToken => 401,
            Self::TokenDisabled | Self::PermissionDenied | Self::SsrfBlocked => 403,
            Self::NotFound | Self::ConfigNotFound | Self::TokenNotFound => 404,
            Self::DuplicateResource
            | Self::DuplicateSubdomain
            | Self::MaxTokensExceeded
            | Self::MaxEntriesExceeded => 409,
            Self::ValidationFailed
            | Self::InvalidInput
            | Self::MissingField
            | Self::InvalidFormat
            | Self::InvalidTarget
            | Self::InvalidProxyConfig => 400,
            Self::InternalError => 500,
            Self::ProxyFailed => 502,
            Self::ServiceUnavailable => 503,
            Self::RateLimitExceeded => 429,
            Self::ResourceExhausted => 507,
        }
    }

    pub fn category(self) -> ErrorCategory {
        match self {
            Self::Unauthorized
            | Self::TokenExpired
            | Self::TokenDisabled
            | Self::InvalidToken
            | Self::PermissionDenied => ErrorCategory::Authentication,
            Self::NotFound
            | Self::ConfigNotFound
            | Self::TokenNotFound
            | Self::DuplicateResource
            | Self::DuplicateSubdomain => ErrorCategory::Resource,
            Self::ValidationFailed
            | Self::InvalidInput
            | Self::MissingField
            | Self::InvalidFormat => ErrorCategory::Validation,
            Self::InternalError
            | Self::ServiceUnavailable
            | Self::RateLimitExceeded
            | Self::ResourceExhausted => ErrorCategory::System,
            Self::MaxTokensExceeded
            | Self::MaxEntriesExceeded
            | Self::InvalidTarget
            | Self::ProxyFailed
            | Self::SsrfBlocked
            | Self::InvalidProxyConfig => ErrorCategory::Business,
        }
    }

    /// Check if this is a client error (4xx equivalent).
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenDisabled => "TOKEN_DISABLED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound => "NOT_FOUND",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::DuplicateResource => "DUPLICATE_RESOURCE",
            Self::DuplicateSubdomain => "DUPLICATE_SUBDOMAIN",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingField => "MISSING_FIELD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::MaxTokensExceeded => "MAX_TOKENS_EXCEEDED",
            Self::MaxEntriesExceeded => "MAX_ENTRIES_EXCEEDED",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::ProxyFailed => "PROXY_FAILED",
            Self::SsrfBlocked => "SSRF_BLOCKED",
            Self::InvalidProxyConfig => "INVALID_PROXY_CONFIG",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
