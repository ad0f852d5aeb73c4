use chrono::{DateTime, Utc};
use relaygate_types::models::{
    normalize_subdomain, BatchAction, BatchOperationResult, BatchRequest, ConfigFilter,
    ConfigListResponse, ConfigStats, CreateConfigRequest, ExportData, ImportRequest, ImportResult,
    ProxyConfig, TargetProtocol, UpdateConfigRequest, EXPORT_FORMAT_VERSION,
};
use relaygate_types::ErrorCode;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{ConfigStore, StoreInner};
use crate::error::{AppError, AppResult};
use crate::proxy::target::parse_proxy_url;

/// Import entries may omit server-assigned fields.
#[derive(Debug, Deserialize)]
struct ImportedConfig {
    #[serde(default)]
    id: Option<String>,
    name: String,
    subdomain: String,
    target_url: String,
    #[serde(default)]
    protocol: TargetProtocol,
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    default_proxy: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    stats: Option<ConfigStats>,
}

enum ImportOutcome {
    Imported,
    Skipped,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_default_proxy(default_proxy: Option<&str>) -> AppResult<()> {
    if let Some(raw) = default_proxy {
        parse_proxy_url(raw).map_err(|e| {
            AppError::new(ErrorCode::InvalidProxyConfig, format!("default_proxy: {}", e.message()))
        })?;
    }
    Ok(())
}

fn duplicate_subdomain(subdomain: &str) -> AppError {
    AppError::new(ErrorCode::DuplicateSubdomain, format!("subdomain '{subdomain}' already exists"))
        .with_detail("subdomain", subdomain)
}

impl StoreInner {
    /// Capacity and uniqueness checks, then insert. Validation is the caller's.
    fn insert_checked(&mut self, config: ProxyConfig, max_configs: usize) -> AppResult<()> {
        if self.configs.contains_key(&config.id) {
            return Err(AppError::new(
                ErrorCode::DuplicateResource,
                format!("config {} already exists", config.id),
            ));
        }
        if self.by_subdomain.contains_key(&config.subdomain) {
            return Err(duplicate_subdomain(&config.subdomain));
        }
        if self.configs.len() >= max_configs {
            return Err(AppError::new(
                ErrorCode::MaxEntriesExceeded,
                format!("config limit of {max_configs} reached"),
            )
            .with_detail("max_configs", max_configs));
        }
        self.by_subdomain.insert(config.subdomain.clone(), config.id.clone());
        self.configs.insert(config.id.clone(), config);
        Ok(())
    }

    fn apply_batch(&mut self, id: &str, action: BatchAction, now: DateTime<Utc>) -> AppResult<()> {
        match action {
            BatchAction::Delete => {
                self.remove_config(id).ok_or_else(|| AppError::config_not_found(id))?;
            },
            BatchAction::Enable | BatchAction::Disable => {
                let config =
                    self.configs.get_mut(id).ok_or_else(|| AppError::config_not_found(id))?;
                config.enabled = action == BatchAction::Enable;
                config.updated_at = now;
            },
        }
        Ok(())
    }

    fn import_one(
        &mut self,
        raw: serde_json::Value,
        skip_existing: bool,
        max_configs: usize,
    ) -> AppResult<ImportOutcome> {
        let entry: ImportedConfig = serde_json::from_value(raw).map_err(|e| {
            AppError::new(ErrorCode::InvalidFormat, format!("malformed config: {e}"))
        })?;

        let now = Utc::now();
        let id = non_empty(entry.id).unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.configs.contains_key(&id) {
            if skip_existing {
                return Ok(ImportOutcome::Skipped);
            }
            return Err(AppError::new(
                ErrorCode::DuplicateResource,
                format!("config {id} already exists"),
            ));
        }

        let created_at = entry.created_at.unwrap_or(now);
        let config = ProxyConfig {
            id,
            name: entry.name.trim().to_string(),
            subdomain: normalize_subdomain(&entry.subdomain),
            target_url: entry.target_url.trim().to_string(),
            protocol: entry.protocol,
            enabled: entry.enabled.unwrap_or(true),
            default_proxy: non_empty(entry.default_proxy),
            description: non_empty(entry.description),
            created_at,
            updated_at: entry.updated_at.unwrap_or(created_at),
            stats: Some(entry.stats.unwrap_or_default()),
        };
        config.validate()?;
        check_default_proxy(config.default_proxy.as_deref())?;

        self.insert_checked(config, max_configs)?;
        Ok(ImportOutcome::Imported)
    }
}

impl ConfigStore {
    pub fn add(&self, req: CreateConfigRequest) -> AppResult<ProxyConfig> {
        req.validate()?;
        let default_proxy = non_empty(req.default_proxy);
        check_default_proxy(default_proxy.as_deref())?;

        let now = Utc::now();
        let config = ProxyConfig {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            subdomain: normalize_subdomain(&req.subdomain),
            target_url: req.target_url.trim().to_string(),
            protocol: req.protocol,
            enabled: req.enabled,
            default_proxy,
            description: non_empty(req.description),
            created_at: now,
            updated_at: now,
            stats: Some(ConfigStats::default()),
        };

        self.inner.write().insert_checked(config.clone(), self.limits.max_configs)?;
        tracing::info!("Created proxy config {} ({})", config.id, config.subdomain);
        self.after_mutation();
        Ok(config)
    }

    pub fn get(&self, id: &str) -> Option<ProxyConfig> {
        self.inner.read().configs.get(id).cloned()
    }

    /// Case-insensitive lookup.
    pub fn get_by_subdomain(&self, subdomain: &str) -> Option<ProxyConfig> {
        let key = normalize_subdomain(subdomain);
        let inner = self.inner.read();
        inner.by_subdomain.get(&key).and_then(|id| inner.configs.get(id)).cloned()
    }

    pub fn contains_subdomain(&self, subdomain: &str) -> bool {
        self.inner.read().by_subdomain.contains_key(&normalize_subdomain(subdomain))
    }

    pub fn update(&self, id: &str, req: UpdateConfigRequest) -> AppResult<ProxyConfig> {
        let updated = {
            let mut inner = self.inner.write();
            let current = inner.configs.get(id).ok_or_else(|| AppError::config_not_found(id))?;

            let mut merged = current.clone();
            if let Some(name) = req.name {
                merged.name = name.trim().to_string();
            }
            if let Some(subdomain) = req.subdomain {
                merged.subdomain = normalize_subdomain(&subdomain);
            }
            if let Some(target_url) = req.target_url {
                merged.target_url = target_url.trim().to_string();
            }
            if let Some(protocol) = req.protocol {
                merged.protocol = protocol;
            }
            if let Some(enabled) = req.enabled {
                merged.enabled = enabled;
            }
            if let Some(default_proxy) = req.default_proxy {
                merged.default_proxy = non_empty(Some(default_proxy));
            }
            if let Some(description) = req.description {
                merged.description = non_empty(Some(description));
            }

            merged.validate()?;
            check_default_proxy(merged.default_proxy.as_deref())?;

            let old_subdomain = current.subdomain.clone();
            if merged.subdomain != old_subdomain {
                if inner.by_subdomain.contains_key(&merged.subdomain) {
                    return Err(duplicate_subdomain(&merged.subdomain));
                }
                inner.by_subdomain.remove(&old_subdomain);
                inner.by_subdomain.insert(merged.subdomain.clone(), merged.id.clone());
            }

            merged.updated_at = Utc::now();
            inner.configs.insert(merged.id.clone(), merged.clone());
            merged
        };

        tracing::info!("Updated proxy config {}", updated.id);
        self.after_mutation();
        Ok(updated)
    }

    /// Removes the config and every token it owns.
    pub fn delete(&self, id: &str) -> AppResult<ProxyConfig> {
        let removed =
            self.inner.write().remove_config(id).ok_or_else(|| AppError::config_not_found(id))?;
        tracing::info!("Deleted proxy config {} ({})", removed.id, removed.subdomain);
        self.after_mutation();
        Ok(removed)
    }

    pub fn batch(&self, req: BatchRequest) -> AppResult<BatchOperationResult> {
        if req.ids.is_empty() {
            return Err(AppError::validation("ids", "ids cannot be empty"));
        }

        let mut result = BatchOperationResult::default();
        {
            let mut inner = self.inner.write();
            let now = Utc::now();
            for id in req.ids {
                match inner.apply_batch(&id, req.action, now) {
                    Ok(()) => result.push_success(id),
                    Err(e) => result.push_failure(id, e.message()),
                }
            }
        }

        tracing::info!(
            action = ?req.action,
            succeeded = result.success_count,
            failed = result.failed_count,
            "Batch operation finished"
        );
        if result.success_count > 0 {
            self.after_mutation();
        }
        Ok(result)
    }

    /// Filtered page, ordered by creation time.
    pub fn list(&self, filter: &ConfigFilter) -> ConfigListResponse {
        let mut matched: Vec<ProxyConfig> =
            self.inner.read().configs.values().filter(|c| filter.matches(c)).cloned().collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let page = filter.page();
        let limit = filter.limit();
        let total = matched.len();
        let configs =
            matched.into_iter().skip(page.saturating_sub(1).saturating_mul(limit)).take(limit).collect();

        ConfigListResponse { configs, total, page, limit, total_pages: total.div_ceil(limit) }
    }

    pub fn export(&self) -> ExportData {
        let mut configs: Vec<ProxyConfig> = self.inner.read().configs.values().cloned().collect();
        configs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        ExportData {
            version: EXPORT_FORMAT_VERSION.to_string(),
            export_at: Utc::now(),
            total_count: configs.len(),
            configs,
        }
    }

    /// Each entry is validated on its own; failures are collected, not fatal.
    pub fn import(&self, req: ImportRequest) -> AppResult<ImportResult> {
        let mut result = ImportResult::default();
        {
            let mut inner = self.inner.write();
            for (idx, raw) in req.configs.into_iter().enumerate() {
                match inner.import_one(raw, req.skip_existing, self.limits.max_configs) {
                    Ok(ImportOutcome::Imported) => result.imported_count += 1,
                    Ok(ImportOutcome::Skipped) => result.skipped_count += 1,
                    Err(e) => {
                        result.error_count += 1;
                        result.errors.push(format!("config {}: {}", idx + 1, e.message()));
                    },
                }
            }
        }

        if result.imported_count > 0 {
            self.after_mutation();
        }
        Ok(result)
    }

    /// Fold one completed forward into the tenant's stats.
    pub fn record_access(&self, config_id: &str, elapsed_ms: u64, bytes: u64, success: bool) {
        if let Some(config) = self.inner.write().configs.get_mut(config_id) {
            config.stats_mut().record(elapsed_ms, bytes, success, Utc::now());
        }
    }
}

#[cfg(test)]
#[path = "configs_tests.rs"]
mod tests;
