//! Application State
//!
//! Shared handles for the HTTP surface: the tenant store, the forward engine,
//! metrics and the admin guard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use relaygate_core::auth::AdminGuard;
use relaygate_core::modules::{JsonFileSnapshot, SnapshotStore};
use relaygate_core::proxy::{Gateway, GatewayOptions};
use relaygate_core::store::StoreLimits;
use relaygate_core::metrics::GaugeSource;
use relaygate_core::{ConfigStore, MetricsCollector};
use relaygate_types::models::GatewayConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub settings: GatewayConfig,
    pub store: Arc<ConfigStore>,
    pub metrics: Arc<MetricsCollector>,
    pub gateway: Gateway,
    pub admin: AdminGuard,
}

impl AppState {
    /// Wire store, metrics and gateway from settings. Tenant configs are
    /// restored from `data_file` when one is configured.
    pub fn from_settings(settings: GatewayConfig) -> Result<Self> {
        let metrics = MetricsCollector::new(Duration::from_secs(settings.metrics_tick_secs.max(1)));

        let mut store =
            ConfigStore::new(StoreLimits::from(&settings)).with_metrics(Arc::clone(&metrics));
        if let Some(path) = &settings.data_file {
            let snapshot: Arc<dyn SnapshotStore> = Arc::new(JsonFileSnapshot::new(path));
            store = store.with_snapshot(snapshot);
        }
        let store = Arc::new(store);
        let gauges: Arc<dyn GaugeSource> = Arc::clone(&store) as Arc<dyn GaugeSource>;
        metrics.attach_gauge_source(Arc::downgrade(&gauges));
        if let Some(result) = store.restore()? {
            tracing::info!(
                "📦 Restored {} tenant configs ({} errors)",
                result.imported_count,
                result.error_count
            );
        }

        let gateway = Gateway::new(
            Arc::clone(&store),
            Arc::clone(&metrics),
            GatewayOptions::from_config(&settings),
        )?;
        let admin = AdminGuard::new(settings.admin_key.clone())
            .with_trusted_proxies(settings.trusted_proxies.clone());

        Ok(Self { inner: Arc::new(AppStateInner { settings, store, metrics, gateway, admin }) })
    }

    pub fn settings(&self) -> &GatewayConfig {
        &self.inner.settings
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.inner.store
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.inner.metrics
    }

    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    pub fn admin(&self) -> &AdminGuard {
        &self.inner.admin
    }
}
