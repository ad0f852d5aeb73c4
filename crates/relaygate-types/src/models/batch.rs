//! Listing, batch and import/export payloads for the config store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::proxy_config::ProxyConfig;

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

const DEFAULT_PAGE_LIMIT: usize = 20;
const MAX_PAGE_LIMIT: usize = 100;

/// Query for `GET /api/configs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFilter {
    /// Case-insensitive substring of name or subdomain
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ConfigFilter {
    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT)
    }

    pub fn matches(&self, config: &ProxyConfig) -> bool {
        if self.enabled.is_some_and(|e| e != config.enabled) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                config.name.to_lowercase().contains(&needle)
                    || config.subdomain.to_lowercase().contains(&needle)
            },
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigListResponse {
    pub configs: Vec<ProxyConfig>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Delete,
    Enable,
    Disable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub action: BatchAction,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

/// Per-id outcome; one bad id never fails the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchOperationResult {
    pub success: Vec<String>,
    pub failed: Vec<BatchFailure>,
    pub success_count: usize,
    pub failed_count: usize,
}

impl BatchOperationResult {
    pub fn push_success(&mut self, id: String) {
        self.success.push(id);
        self.success_count = self.success.len();
    }

    pub fn push_failure(&mut self, id: String, error: impl Into<String>) {
        self.failed.push(BatchFailure { id, error: error.into() });
        self.failed_count = self.failed.len();
    }
}

/// Versioned snapshot produced by export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: String,
    pub export_at: DateTime<Utc>,
    pub configs: Vec<ProxyConfig>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub configs: Vec<serde_json::Value>,
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,
}

fn default_skip_existing() -> bool {
    true
}

impl From<ExportData> for ImportRequest {
    fn from(data: ExportData) -> Self {
        Self {
            configs: data
                .configs
                .into_iter()
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect(),
            skip_existing: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportResult {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
}
