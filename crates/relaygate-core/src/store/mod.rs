//! In-memory store of tenant configs and their access tokens.
//!
//! All mutations take the single write lock, so a reader sees either the
//! whole change or none of it. Tokens additionally sit behind their own mutex
//! so usage accounting never needs the store-wide write lock.

mod configs;
mod tokens;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use relaygate_types::models::{AccessToken, GatewayConfig, ImportResult, ProxyConfig};

use crate::error::AppResult;
use crate::metrics::{GaugeSource, MetricsCollector};
use crate::modules::persistence::SnapshotStore;

#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    pub max_configs: usize,
    pub max_tokens_per_config: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self { max_configs: 1000, max_tokens_per_config: 50 }
    }
}

impl From<&GatewayConfig> for StoreLimits {
    fn from(cfg: &GatewayConfig) -> Self {
        Self { max_configs: cfg.max_configs, max_tokens_per_config: cfg.max_tokens_per_config }
    }
}

#[derive(Default)]
pub(crate) struct StoreInner {
    pub(crate) configs: HashMap<String, ProxyConfig>,
    /// lowercase subdomain -> config id
    pub(crate) by_subdomain: HashMap<String, String>,
    pub(crate) tokens: HashMap<String, Arc<Mutex<AccessToken>>>,
    /// token hash -> token id
    pub(crate) token_by_hash: HashMap<String, String>,
}

impl StoreInner {
    pub(crate) fn remove_config(&mut self, id: &str) -> Option<ProxyConfig> {
        let config = self.configs.remove(id)?;
        self.by_subdomain.remove(&config.subdomain);

        let owned: Vec<String> = self
            .tokens
            .iter()
            .filter(|(_, t)| t.lock().config_id == id)
            .map(|(token_id, _)| token_id.clone())
            .collect();
        for token_id in owned {
            if let Some(token) = self.tokens.remove(&token_id) {
                self.token_by_hash.remove(&token.lock().token_hash);
            }
        }
        Some(config)
    }

    pub(crate) fn token_count(&self, config_id: &str) -> usize {
        self.tokens.values().filter(|t| t.lock().config_id == config_id).count()
    }
}

pub struct ConfigStore {
    pub(crate) inner: RwLock<StoreInner>,
    pub(crate) limits: StoreLimits,
    metrics: Option<Arc<MetricsCollector>>,
    snapshot: Option<Arc<dyn SnapshotStore>>,
    persist_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            limits,
            metrics: None,
            snapshot: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Publish config/token gauges to this collector after each mutation.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Hand the export to this sink after each mutation.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Arc<dyn SnapshotStore>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Import the last saved snapshot, if any.
    pub fn restore(&self) -> AppResult<Option<ImportResult>> {
        let Some(sink) = self.snapshot.as_ref() else {
            return Ok(None);
        };
        let Some(data) = sink.load()? else {
            return Ok(None);
        };
        let result = self.import(data.into())?;
        tracing::info!(
            imported = result.imported_count,
            skipped = result.skipped_count,
            errors = result.error_count,
            "Restored proxy configs from snapshot"
        );
        Ok(Some(result))
    }

    pub fn config_count(&self) -> usize {
        self.inner.read().configs.len()
    }

    pub fn token_total(&self) -> usize {
        self.inner.read().tokens.len()
    }

    fn publish_gauges(&self) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let (total_configs, active_configs, total_tokens, active_tokens) = {
            let inner = self.inner.read();
            let active_configs = inner.configs.values().filter(|c| c.enabled).count();
            let active_tokens = inner.tokens.values().filter(|t| t.lock().is_active()).count();
            (inner.configs.len(), active_configs, inner.tokens.len(), active_tokens)
        };
        metrics.set_store_gauges(
            total_configs as u64,
            active_configs as u64,
            total_tokens as u64,
            active_tokens as u64,
        );
    }

    /// Gauges and snapshot; called after the write lock is released.
    pub(crate) fn after_mutation(&self) {
        self.publish_gauges();

        if let Some(sink) = &self.snapshot {
            let _serial = self.persist_lock.lock();
            let data = self.export();
            if let Err(e) = sink.save(&data) {
                tracing::warn!("Failed to persist config snapshot: {}", e);
            }
        }
    }
}

impl GaugeSource for ConfigStore {
    fn refresh_gauges(&self) {
        self.publish_gauges();
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}
