//! Authentication: the shared admin secret and per-tenant access tokens.

pub mod admin;
pub mod rate_limiter;
pub mod token;

pub use admin::{client_ip, constant_time_compare, AdminGuard, ADMIN_KEY_HEADER};
pub use rate_limiter::AuthFailureTracker;
pub use token::{
    extract_access_token, generate_token, Sha256TokenHasher, TokenHasher, ACCESS_TOKEN_HEADER,
    ACCESS_TOKEN_QUERY_PARAM,
};
