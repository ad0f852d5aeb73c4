//! Proxy engine.
//!
//! A forward runs classify -> tenant -> token gate -> destination -> resolve
//! -> SSRF validate -> client -> send. Only [`ssrf::validate`] can produce the
//! [`ValidatedTarget`] the client factory takes.

pub mod client;
pub mod dispatch;
pub mod forward;
pub mod headers;
pub mod middleware;
pub mod ssrf;
pub mod target;

pub use client::ClientFactory;
pub use dispatch::{classify, RouteKind};
pub use forward::{Gateway, GatewayOptions};
pub use ssrf::{SsrfPolicy, ValidatedTarget};
