//! # RelayGate Types
//!
//! Core types, models, and error definitions for RelayGate.
//!
//! - **`error`** - Closed error-code taxonomy and the JSON error envelope
//! - **`models`** - Tenant configs, access tokens, proxy targets, metrics views, settings
//!
//! ## Architecture Role
//!
//! ```text
//!          relaygate-types (this crate)
//!                  │
//!                  ▼
//!          relaygate-core
//!                  │
//!                  ▼
//!          relaygate-server
//! ```
//!
//! Everything here is plain data: serializable, cloneable, no I/O.

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, ErrorCode, ErrorResponse};

// Re-export core model types
pub use models::{
    AccessToken, ConfigStats, GatewayConfig, MetricsSnapshot, ProxyConfig, ProxyScheme,
    ProxyTarget, TokenStatus,
};
