//! Access token model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_TOKEN_NAME_LENGTH: usize = 100;

/// Derived lifecycle state; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Active,
    Disabled,
    Expired,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token name is required")]
    NameRequired,
    #[error("token name cannot exceed {max} characters")]
    NameTooLong { max: usize },
    #[error("token hash is required")]
    HashRequired,
    #[error("expiration must be in the future")]
    ExpiryNotInFuture,
}

impl TokenValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameRequired | Self::NameTooLong { .. } => "name",
            Self::HashRequired => "token_hash",
            Self::ExpiryNotInFuture => "expires_at",
        }
    }
}

/// Per-tenant scoped credential. Only the hash of the secret is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub id: String,
    /// Owning config (back-reference by id)
    pub config_id: String,
    pub name: String,
    pub token_hash: String,
    /// First characters of the raw secret, for recognition in listings
    #[serde(default)]
    pub token_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    pub usage_count: u64,
    pub enabled: bool,
    #[serde(default)]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AccessToken {
    /// Expiry is checked before the enabled flag.
    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        if self.expires_at.is_some_and(|exp| exp <= now) {
            TokenStatus::Expired
        } else if !self.enabled {
            TokenStatus::Disabled
        } else {
            TokenStatus::Active
        }
    }

    pub fn status(&self) -> TokenStatus {
        self.status_at(Utc::now())
    }

    pub fn is_active(&self) -> bool {
        self.status() == TokenStatus::Active
    }

    /// Record one authorized use.
    pub fn update_usage(&mut self) {
        let now = Utc::now();
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used = Some(now);
        self.updated_at = now;
    }

    /// Creation-time checks; `expires_at` must be strictly after `now`.
    pub fn validate_new(&self, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(TokenValidationError::NameRequired);
        }
        if name.chars().count() > MAX_TOKEN_NAME_LENGTH {
            return Err(TokenValidationError::NameTooLong { max: MAX_TOKEN_NAME_LENGTH });
        }
        if self.token_hash.is_empty() {
            return Err(TokenValidationError::HashRequired);
        }
        if self.expires_at.is_some_and(|exp| exp <= now) {
            return Err(TokenValidationError::ExpiryNotInFuture);
        }
        Ok(())
    }

    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            id: self.id.clone(),
            config_id: self.config_id.clone(),
            name: self.name.clone(),
            token_prefix: self.token_prefix.clone(),
            status: self.status(),
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_used: self.last_used,
            usage_count: self.usage_count,
            enabled: self.enabled,
            created_by: self.created_by.clone(),
            description: self.description.clone(),
        }
    }
}

/// Wire view of a token; never carries the hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub id: String,
    pub config_id: String,
    pub name: String,
    pub token_prefix: String,
    pub status: TokenStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub usage_count: u64,
    pub enabled: bool,
    pub created_by: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTokenRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Returned once at creation; the raw token is not recoverable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedToken {
    pub token: String,
    #[serde(flatten)]
    pub info: TokenInfo,
}
