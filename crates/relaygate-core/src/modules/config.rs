//! Gateway settings file: load, validate, save.

use std::fs;
use std::path::{Path, PathBuf};

use relaygate_types::error::ConfigError;
use relaygate_types::models::GatewayConfig;
use validator::Validate;

const CONFIG_FILE: &str = "relaygate.json";
const APP_DIR: &str = "relaygate";

/// Default settings path: `<config dir>/relaygate/relaygate.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Load settings; a missing file yields defaults.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No settings file, using defaults");
        return Ok(GatewayConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, &e))?;
    let config: GatewayConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, &e))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), ConfigError> {
    config.validate().map_err(|errors| {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string()))
                    .unwrap_or_default();
                (field.to_string(), message)
            })
            .unwrap_or_default();
        ConfigError::Invalid { field, message }
    })
}

/// Save settings atomically (temp file + rename).
pub fn save_config(path: &Path, config: &GatewayConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::write(path, e))?;
    }
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::write(path, e))?;

    fs::write(&temp_path, content).map_err(|e| ConfigError::write(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::write(path, e))
}

/// Load, mutate, save.
pub fn update_config<F>(path: &Path, updater: F) -> Result<GatewayConfig, ConfigError>
where
    F: FnOnce(&mut GatewayConfig),
{
    let mut config = load_config(path)?;
    updater(&mut config);
    validate_config(&config)?;
    save_config(path, &config)?;
    Ok(config)
}
