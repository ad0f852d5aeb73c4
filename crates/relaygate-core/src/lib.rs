//! # RelayGate Core
//!
//! Request-dispatch and proxy-safety engine for the RelayGate gateway.
//!
//! ```text
//! relaygate-core/src/
//! ├── auth/      # admin secret, access-token hashing, failed-auth limiter
//! ├── store/     # tenant configs + their tokens, one lock for all mutations
//! ├── proxy/     # classify, resolve, SSRF guard, client factory, forward
//! ├── metrics/   # lock-free counters, 60-minute history, health
//! └── modules/   # settings file, logger, snapshot persistence
//! ```
//!
//! The HTTP surface lives in `relaygate-server`; everything here is usable
//! without a listener, which is how the tests drive it.

#![allow(
    clippy::significant_drop_tightening,
    reason = "parking_lot guards are scoped explicitly around O(1) sections"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(
    clippy::module_name_repetitions,
    reason = "Store/Config prefixes read better at call sites"
)]
// Test-only lints: allow panic!, float comparisons, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::float_cmp,
        clippy::assertions_on_result_states
    )
)]

pub mod auth;
pub mod error;
pub mod metrics;
pub mod modules;
pub mod proxy;
pub mod store;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use metrics::MetricsCollector;
pub use proxy::{Gateway, GatewayOptions};
pub use store::ConfigStore;
