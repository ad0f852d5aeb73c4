//! Domain models for RelayGate.
//!
//! Shared data structures used by the core engine and the HTTP surface.

mod batch;
mod metrics;
mod proxy_config;
mod settings;
mod target;
mod token;

pub use batch::{
    BatchAction, BatchFailure, BatchOperationResult, BatchRequest, ConfigFilter,
    ConfigListResponse, ExportData, ImportRequest, ImportResult, EXPORT_FORMAT_VERSION,
};
pub use metrics::{HealthCheck, HealthReport, HealthState, MetricsHistory, MetricsSnapshot};
pub use proxy_config::{
    normalize_subdomain, validate_subdomain, validate_target_url, ConfigStats,
    CreateConfigRequest, ProxyConfig, TargetProtocol, UpdateConfigRequest, MAX_CONFIG_NAME_LENGTH,
    RESERVED_SUBDOMAINS,
};
pub use settings::GatewayConfig;
pub use target::{ProxyCredentials, ProxyScheme, ProxyTarget, DEFAULT_TIMEOUT_SECS};
pub use token::{
    AccessToken, CreateTokenRequest, CreatedToken, TokenInfo, TokenStatus, TokenValidationError,
    UpdateTokenRequest, MAX_TOKEN_NAME_LENGTH,
};
