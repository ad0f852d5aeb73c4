//! Access-token secrets: generation, hashing, extraction from requests.

use axum::http::HeaderMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const ACCESS_TOKEN_QUERY_PARAM: &str = "access_token";

const TOKEN_PREFIX: &str = "rg_";
const TOKEN_RANDOM_LEN: usize = 40;
/// Characters of the raw token kept for display.
pub const DISPLAY_PREFIX_LEN: usize = 8;

/// One-way transform applied to raw tokens before they reach the store.
pub trait TokenHasher: Send + Sync {
    fn hash(&self, raw: &str) -> String;
}

/// Hex-encoded SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256TokenHasher;

impl TokenHasher for Sha256TokenHasher {
    fn hash(&self, raw: &str) -> String {
        let digest = Sha256::digest(raw.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// `rg_` followed by 40 random alphanumerics.
pub fn generate_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{TOKEN_PREFIX}{random}")
}

pub fn display_prefix(raw: &str) -> String {
    raw.chars().take(DISPLAY_PREFIX_LEN).collect()
}

/// Header `X-Access-Token` first, then the `access_token` query parameter.
pub fn extract_access_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            query.and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(k, _)| k == ACCESS_TOKEN_QUERY_PARAM)
                    .map(|(_, v)| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        })
}
