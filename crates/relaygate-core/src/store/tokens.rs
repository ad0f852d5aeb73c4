use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use relaygate_types::models::{
    AccessToken, CreateTokenRequest, CreatedToken, TokenInfo, TokenStatus, TokenValidationError,
    UpdateTokenRequest, MAX_TOKEN_NAME_LENGTH,
};
use relaygate_types::ErrorCode;
use uuid::Uuid;

use super::ConfigStore;
use crate::auth::token::{display_prefix, generate_token, TokenHasher};
use crate::error::{AppError, AppResult};

const DEFAULT_CREATED_BY: &str = "admin";

impl ConfigStore {
    /// Mint a token for `config_id`. The raw secret is only in the return value.
    pub fn create_token(
        &self,
        config_id: &str,
        req: CreateTokenRequest,
        hasher: &dyn TokenHasher,
    ) -> AppResult<CreatedToken> {
        let raw = generate_token();
        let now = Utc::now();
        let token = AccessToken {
            id: Uuid::new_v4().to_string(),
            config_id: config_id.to_string(),
            name: req.name.trim().to_string(),
            token_hash: hasher.hash(&raw),
            token_prefix: display_prefix(&raw),
            expires_at: req.expires_at,
            created_at: now,
            updated_at: now,
            last_used: None,
            usage_count: 0,
            enabled: true,
            created_by: req
                .created_by
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string()),
            description: req.description.filter(|d| !d.trim().is_empty()),
        };

        {
            let mut inner = self.inner.write();
            if !inner.configs.contains_key(config_id) {
                return Err(AppError::config_not_found(config_id));
            }
            token.validate_new(now)?;

            let max = self.limits.max_tokens_per_config;
            if inner.token_count(config_id) >= max {
                return Err(AppError::new(
                    ErrorCode::MaxTokensExceeded,
                    format!("token limit of {max} reached for this config"),
                )
                .with_detail("max_tokens", max));
            }
            if inner.token_by_hash.contains_key(&token.token_hash) {
                return Err(AppError::new(ErrorCode::DuplicateResource, "token already exists"));
            }

            inner.token_by_hash.insert(token.token_hash.clone(), token.id.clone());
            inner.tokens.insert(token.id.clone(), Arc::new(Mutex::new(token.clone())));
        }

        tracing::info!("Created access token {} for config {}", token.id, config_id);
        self.after_mutation();
        Ok(CreatedToken { token: raw, info: token.info() })
    }

    pub fn list_tokens(&self, config_id: &str) -> AppResult<Vec<TokenInfo>> {
        let inner = self.inner.read();
        if !inner.configs.contains_key(config_id) {
            return Err(AppError::config_not_found(config_id));
        }
        let mut infos: Vec<TokenInfo> = inner
            .tokens
            .values()
            .map(|t| t.lock())
            .filter(|t| t.config_id == config_id)
            .map(|t| t.info())
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(infos)
    }

    pub fn get_token(&self, config_id: &str, token_id: &str) -> AppResult<TokenInfo> {
        let token = self.owned_token(config_id, token_id)?;
        let info = token.lock().info();
        Ok(info)
    }

    pub fn update_token(
        &self,
        config_id: &str,
        token_id: &str,
        req: UpdateTokenRequest,
    ) -> AppResult<TokenInfo> {
        let token = self.owned_token(config_id, token_id)?;
        let info = {
            let mut token = token.lock();
            let now = Utc::now();

            if let Some(name) = &req.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(TokenValidationError::NameRequired.into());
                }
                if name.chars().count() > MAX_TOKEN_NAME_LENGTH {
                    return Err(TokenValidationError::NameTooLong { max: MAX_TOKEN_NAME_LENGTH }.into());
                }
            }
            if req.expires_at.is_some_and(|exp| exp <= now) {
                return Err(TokenValidationError::ExpiryNotInFuture.into());
            }

            if let Some(name) = req.name {
                token.name = name.trim().to_string();
            }
            if let Some(description) = req.description {
                token.description = Some(description).filter(|d| !d.trim().is_empty());
            }
            if let Some(enabled) = req.enabled {
                token.enabled = enabled;
            }
            if let Some(expires_at) = req.expires_at {
                token.expires_at = Some(expires_at);
            }
            token.updated_at = now;
            token.info()
        };

        tracing::info!("Updated access token {}", token_id);
        self.after_mutation();
        Ok(info)
    }

    pub fn delete_token(&self, config_id: &str, token_id: &str) -> AppResult<()> {
        {
            let mut inner = self.inner.write();
            let owned = inner
                .tokens
                .get(token_id)
                .is_some_and(|t| t.lock().config_id == config_id);
            if !owned {
                return Err(AppError::token_not_found(token_id));
            }
            if let Some(token) = inner.tokens.remove(token_id) {
                let hash = token.lock().token_hash.clone();
                inner.token_by_hash.remove(&hash);
            }
        }

        tracing::info!("Deleted access token {}", token_id);
        self.after_mutation();
        Ok(())
    }

    /// Check a presented token by hash and count the use when it is active.
    /// With `config_id`, the token must also belong to that config.
    ///
    /// Only the token's own mutex is held while usage is recorded, so
    /// concurrent checks of the same token never lose an increment.
    pub fn authenticate(&self, token_hash: &str, config_id: Option<&str>) -> AppResult<AccessToken> {
        let token = {
            let inner = self.inner.read();
            inner.token_by_hash.get(token_hash).and_then(|id| inner.tokens.get(id)).cloned()
        };
        let Some(token) = token else {
            return Err(AppError::unauthorized("invalid access token"));
        };

        let mut token = token.lock();
        // ownership first, so a foreign tenant learns nothing about the token
        if config_id.is_some_and(|id| id != token.config_id) {
            return Err(AppError::new(
                ErrorCode::PermissionDenied,
                "access token does not belong to this config",
            ));
        }
        match token.status() {
            TokenStatus::Expired => {
                Err(AppError::new(ErrorCode::TokenExpired, "access token has expired")
                    .with_detail("token_id", token.id.as_str()))
            },
            TokenStatus::Disabled => {
                Err(AppError::new(ErrorCode::TokenDisabled, "access token is disabled")
                    .with_detail("token_id", token.id.as_str()))
            },
            TokenStatus::Active => {
                token.update_usage();
                Ok(token.clone())
            },
        }
    }

    fn owned_token(&self, config_id: &str, token_id: &str) -> AppResult<Arc<Mutex<AccessToken>>> {
        let inner = self.inner.read();
        if !inner.configs.contains_key(config_id) {
            return Err(AppError::config_not_found(config_id));
        }
        inner
            .tokens
            .get(token_id)
            .filter(|t| t.lock().config_id == config_id)
            .cloned()
            .ok_or_else(|| AppError::token_not_found(token_id))
    }
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
